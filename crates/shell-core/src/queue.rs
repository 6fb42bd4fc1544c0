use crate::error::ShellError;
use crate::execution::ExecutionId;
use crate::handler::ExecutionMessageHandler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Job asking for an already-created execution record to be run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionMessage {
    pub execution_id: ExecutionId,
}

impl ExecutionMessage {
    pub fn new(execution_id: ExecutionId) -> Self {
        Self { execution_id }
    }
}

/// Publishes execution jobs. Delivery is at-least-once.
#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    async fn dispatch(&self, message: ExecutionMessage) -> Result<(), ShellError>;
}

/// In-process bus backed by an unbounded tokio channel.
pub struct ChannelBus {
    sender: mpsc::UnboundedSender<ExecutionMessage>,
}

impl ChannelBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExecutionMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait::async_trait]
impl MessageBus for ChannelBus {
    async fn dispatch(&self, message: ExecutionMessage) -> Result<(), ShellError> {
        debug!("Queueing execution {}", message.execution_id);
        self.sender
            .send(message)
            .map_err(|e| ShellError::Queue(format!("consumer is gone: {}", e)))
    }
}

/// Feed every message on `receiver` to `handler` until all senders are dropped.
pub fn spawn_consumer(
    mut receiver: mpsc::UnboundedReceiver<ExecutionMessage>,
    handler: Arc<ExecutionMessageHandler>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if let Err(e) = handler.handle(message).await {
                error!("Execution {} could not be handled: {}", message.execution_id, e);
            }
        }
        debug!("Execution consumer stopped");
    })
}

/// Bus that spools each message as a JSON file in a directory, for
/// hand-off between processes. `drain` removes a file only after the
/// handler has returned, so a crash mid-run redelivers the job.
pub struct SpoolBus {
    dir: PathBuf,
}

impl SpoolBus {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Spooled messages, oldest file name first.
    pub fn pending(&self) -> Result<Vec<(PathBuf, ExecutionMessage)>, ShellError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            let data = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<ExecutionMessage>(&data) {
                Ok(message) => messages.push((path, message)),
                Err(e) => warn!("Ignoring malformed job {}: {}", path.display(), e),
            }
        }
        Ok(messages)
    }

    /// Hand every spooled message to `handler`. Returns how many were processed.
    pub async fn drain(&self, handler: &ExecutionMessageHandler) -> Result<usize, ShellError> {
        let pending = self.pending()?;
        let mut processed = 0;
        for (path, message) in pending {
            if let Err(e) = handler.handle(message).await {
                error!("Execution {} could not be handled: {}", message.execution_id, e);
                continue;
            }
            std::fs::remove_file(&path)?;
            processed += 1;
        }
        if processed > 0 {
            info!("Processed {} queued execution(s)", processed);
        }
        Ok(processed)
    }
}

#[async_trait::async_trait]
impl MessageBus for SpoolBus {
    async fn dispatch(&self, message: ExecutionMessage) -> Result<(), ShellError> {
        std::fs::create_dir_all(&self.dir)?;
        // Millisecond prefix keeps file names in publish order.
        let name = format!(
            "{:013}-{}.json",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4()
        );
        let path = self.dir.join(name);
        std::fs::write(&path, serde_json::to_string(&message)?)?;
        debug!("Spooled execution {} to {}", message.execution_id, path.display());
        Ok(())
    }
}
