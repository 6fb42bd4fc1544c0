use shell_core::error::ShellError;
use shell_core::remote::{wrap_command, CommandResult, RemoteCommand, RemoteCommandService, RemoteStatus};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs commands for local nodes directly on this machine through `sh -c`.
#[derive(Debug, Clone)]
pub struct LocalCommandService {
    shell: String,
}

impl LocalCommandService {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// Use a different POSIX shell binary.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalCommandService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteCommandService for LocalCommandService {
    async fn execute_command(&self, command: &RemoteCommand) -> Result<CommandResult, ShellError> {
        let line = wrap_command(command);
        debug!("Local exec: {}", line);
        info!("Running '{}' on {}", command.name, command.node);

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(&line)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_secs(command.timeout), child).await {
            Ok(output) => {
                output.map_err(|e| ShellError::Process(format!("Failed to spawn: {}", e)))?
            }
            Err(_) => {
                warn!("'{}' exceeded {}s, killed", command.name, command.timeout);
                return Ok(CommandResult::new(
                    RemoteStatus::Timeout,
                    format!("command timed out after {}s", command.timeout),
                ));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let status = if output.status.success() {
            RemoteStatus::Completed
        } else {
            debug!("Local command exited with {}", output.status);
            RemoteStatus::Failed
        };
        Ok(CommandResult::new(status, text))
    }
}
