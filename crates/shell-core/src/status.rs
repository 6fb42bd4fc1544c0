use crate::error::ShellError;
use crate::remote::RemoteStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a script execution record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    Canceled,
}

impl CommandStatus {
    pub const ALL: [CommandStatus; 6] = [
        CommandStatus::Pending,
        CommandStatus::Running,
        CommandStatus::Completed,
        CommandStatus::Failed,
        CommandStatus::Timeout,
        CommandStatus::Canceled,
    ];

    /// Stable token used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Running => "running",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
            CommandStatus::Timeout => "timeout",
            CommandStatus::Canceled => "canceled",
        }
    }

    /// Human-readable label shown to operators.
    pub fn label(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "待执行",
            CommandStatus::Running => "执行中",
            CommandStatus::Completed => "已完成",
            CommandStatus::Failed => "失败",
            CommandStatus::Timeout => "超时",
            CommandStatus::Canceled => "已取消",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandStatus::Completed
                | CommandStatus::Failed
                | CommandStatus::Timeout
                | CommandStatus::Canceled
        )
    }

    /// Map the status reported by the remote command service onto ours.
    /// A command that reported no status cannot be mapped.
    pub fn from_remote(status: Option<RemoteStatus>) -> Result<Self, ShellError> {
        match status {
            Some(RemoteStatus::Pending) => Ok(CommandStatus::Pending),
            Some(RemoteStatus::Running) => Ok(CommandStatus::Running),
            Some(RemoteStatus::Completed) => Ok(CommandStatus::Completed),
            Some(RemoteStatus::Failed) => Ok(CommandStatus::Failed),
            Some(RemoteStatus::Timeout) => Ok(CommandStatus::Timeout),
            Some(RemoteStatus::Canceled) => Ok(CommandStatus::Canceled),
            None => Err(ShellError::StatusMapping(
                "remote command reported no status".into(),
            )),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandStatus {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommandStatus::Pending),
            "running" => Ok(CommandStatus::Running),
            "completed" => Ok(CommandStatus::Completed),
            "failed" => Ok(CommandStatus::Failed),
            "timeout" => Ok(CommandStatus::Timeout),
            "canceled" => Ok(CommandStatus::Canceled),
            other => Err(ShellError::InvalidStatus(other.to_string())),
        }
    }
}
