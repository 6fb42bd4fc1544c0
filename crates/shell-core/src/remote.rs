use crate::error::ShellError;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status vocabulary of the remote command service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    Canceled,
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStatus::Pending => write!(f, "pending"),
            RemoteStatus::Running => write!(f, "running"),
            RemoteStatus::Completed => write!(f, "completed"),
            RemoteStatus::Failed => write!(f, "failed"),
            RemoteStatus::Timeout => write!(f, "timeout"),
            RemoteStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A shell command bound to a node, ready to be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub node: Node,
    pub name: String,
    pub command: String,
    pub working_directory: String,
    pub use_sudo: bool,
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: Option<RemoteStatus>,
    pub output: String,
}

impl CommandResult {
    pub fn new(status: RemoteStatus, output: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            output: output.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(RemoteStatus::Completed)
    }
}

/// Runs shell commands on nodes.
///
/// `execute_command` returns `Err` only when the command could not be run at
/// all (connection refused, spawn failure). A command that ran and failed is
/// an `Ok` carrying a non-completed status.
#[async_trait::async_trait]
pub trait RemoteCommandService: Send + Sync {
    fn create_command(
        &self,
        node: &Node,
        name: &str,
        command: &str,
        working_directory: &str,
        use_sudo: bool,
        timeout: u64,
    ) -> RemoteCommand {
        RemoteCommand {
            node: node.clone(),
            name: name.to_string(),
            command: command.to_string(),
            working_directory: working_directory.to_string(),
            use_sudo,
            timeout,
        }
    }

    async fn execute_command(&self, command: &RemoteCommand) -> Result<CommandResult, ShellError>;
}

/// Shell-escape a string for safe use in remote commands.
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// The full shell line for a command: change into its working directory,
/// then run it, through `sudo` when asked.
pub fn wrap_command(command: &RemoteCommand) -> String {
    let body = if command.use_sudo {
        format!("sudo -n sh -c {}", shell_escape(&command.command))
    } else {
        command.command.clone()
    };
    format!("cd {} && {}", shell_escape(&command.working_directory), body)
}
