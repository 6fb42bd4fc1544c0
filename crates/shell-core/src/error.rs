use crate::execution::ExecutionId;
use crate::script::ScriptId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Script '{name}' ({id}) is disabled and cannot be executed")]
    ScriptDisabled { id: ScriptId, name: String },

    #[error("Script upload failed: {0}")]
    ScriptUpload(String),

    #[error("Unmappable command status: {0}")]
    StatusMapping(String),

    #[error("Invalid status token: '{0}'")]
    InvalidStatus(String),

    #[error("Invalid script definition: {0}")]
    Validation(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(ScriptId),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(ExecutionId),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("SSH connection failed: {0}")]
    SshConnection(String),

    #[error("SSH command failed: {0}")]
    SshCommand(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
