use crate::error::ShellError;
use crate::queue::ExecutionMessage;
use crate::execution::ExecutionRecord;
use crate::service::{ensure_enabled, ShellScriptService};
use crate::status::CommandStatus;
use crate::store::{ExecutionStore, ScriptStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Consumer side of the execution queue.
///
/// Messages may arrive more than once and carry only a record id, so every
/// delivery re-reads the record and only acts on it while it is PENDING.
pub struct ExecutionMessageHandler {
    service: Arc<ShellScriptService>,
    scripts: Arc<dyn ScriptStore>,
    executions: Arc<dyn ExecutionStore>,
}

impl ExecutionMessageHandler {
    pub fn new(
        service: Arc<ShellScriptService>,
        scripts: Arc<dyn ScriptStore>,
        executions: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            service,
            scripts,
            executions,
        }
    }

    pub async fn handle(&self, message: ExecutionMessage) -> Result<(), ShellError> {
        let execution_id = message.execution_id;
        let Some(mut record) = self.executions.find(execution_id).await? else {
            error!(execution_id = %execution_id, "Execution record not found, dropping job");
            return Ok(());
        };

        if record.status != CommandStatus::Pending {
            warn!(
                execution_id = %execution_id,
                status = %record.status,
                "Execution is not pending, ignoring job"
            );
            return Ok(());
        }

        info!("Running queued execution {}", execution_id);
        if let Err(e) = self.run_queued(&mut record).await {
            error!(execution_id = %execution_id, "Async script execution failed: {}", e);
            record.mark_failed(format!("async execution error: {}", e), None);
            self.executions.save(&record).await?;
        }
        Ok(())
    }

    /// The script is re-read so that disabling it stops runs already queued.
    async fn run_queued(&self, record: &mut ExecutionRecord) -> Result<(), ShellError> {
        let script = self
            .scripts
            .find(record.script_id)
            .await?
            .ok_or(ShellError::ScriptNotFound(record.script_id))?;
        ensure_enabled(&script)?;
        self.service.run_execution(&script, record).await
    }
}
