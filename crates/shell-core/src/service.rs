use crate::config::Defaults;
use crate::error::ShellError;
use crate::execution::{ExecutionId, ExecutionRecord};
use crate::node::Node;
use crate::queue::{ExecutionMessage, MessageBus};
use crate::remote::{CommandResult, RemoteCommandService};
use crate::script::{NewScript, ScriptDefinition, ScriptId, ScriptUpdate};
use crate::status::CommandStatus;
use crate::store::{ExecutionStore, ScriptStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where scripts are staged and how long transfer commands may take.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub temp_script_dir: PathBuf,
    pub remote_script_dir: String,
    pub transfer_timeout: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Defaults::default())
    }
}

impl From<&Defaults> for ServiceSettings {
    fn from(defaults: &Defaults) -> Self {
        Self {
            temp_script_dir: defaults.temp_script_dir.clone(),
            remote_script_dir: defaults.remote_script_dir.clone(),
            transfer_timeout: defaults.transfer_timeout,
        }
    }
}

/// Deploys scripts to nodes, runs them and records the outcome.
pub struct ShellScriptService {
    remote: Arc<dyn RemoteCommandService>,
    scripts: Arc<dyn ScriptStore>,
    executions: Arc<dyn ExecutionStore>,
    bus: Arc<dyn MessageBus>,
    settings: ServiceSettings,
}

impl ShellScriptService {
    pub fn new(
        remote: Arc<dyn RemoteCommandService>,
        scripts: Arc<dyn ScriptStore>,
        executions: Arc<dyn ExecutionStore>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            remote,
            scripts,
            executions,
            bus,
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn create_script(&self, draft: NewScript) -> Result<ScriptDefinition, ShellError> {
        let script = self.scripts.create(draft).await?;
        info!("Created script {} ({})", script.name, script.id);
        Ok(script)
    }

    pub async fn update_script(
        &self,
        id: ScriptId,
        update: ScriptUpdate,
    ) -> Result<ScriptDefinition, ShellError> {
        let mut script = self
            .scripts
            .find(id)
            .await?
            .ok_or(ShellError::ScriptNotFound(id))?;
        script.apply(update);
        self.scripts.save(&script).await?;
        Ok(script)
    }

    pub async fn find_script(&self, id: ScriptId) -> Result<Option<ScriptDefinition>, ShellError> {
        self.scripts.find(id).await
    }

    pub async fn find_enabled_scripts(&self) -> Result<Vec<ScriptDefinition>, ShellError> {
        self.scripts.find_all_enabled().await
    }

    pub async fn find_scripts_by_tags(
        &self,
        tags: &[String],
    ) -> Result<Vec<ScriptDefinition>, ShellError> {
        self.scripts.find_by_tags(tags).await
    }

    pub async fn find_execution(
        &self,
        id: ExecutionId,
    ) -> Result<Option<ExecutionRecord>, ShellError> {
        self.executions.find(id).await
    }

    pub async fn find_executions_by_node(
        &self,
        node: &Node,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        self.executions.find_by_node(&node.name).await
    }

    pub async fn find_executions_by_script(
        &self,
        script: &ScriptDefinition,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        self.executions.find_by_script(script.id).await
    }

    pub async fn find_executions_by_node_and_script(
        &self,
        node: &Node,
        script: &ScriptDefinition,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        self.executions
            .find_by_node_and_script(&node.name, script.id)
            .await
    }

    pub async fn find_executions_by_status(
        &self,
        status: CommandStatus,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        self.executions.find_by_status(status).await
    }

    /// Run `script` on `node` and wait for the outcome.
    ///
    /// Fails only if the script is disabled or the record cannot be created.
    /// Everything that goes wrong afterwards is reported through the returned
    /// record's status and result.
    pub async fn execute(
        &self,
        script: &ScriptDefinition,
        node: &Node,
    ) -> Result<ExecutionRecord, ShellError> {
        ensure_enabled(script)?;
        let mut record = self.executions.create(script, node).await?;
        info!(
            "Executing script {} ({}) on {} as execution {}",
            script.name, script.id, node, record.id
        );
        self.run_execution(script, &mut record).await?;
        Ok(record)
    }

    /// Create a PENDING record and queue it for asynchronous execution.
    pub async fn schedule(
        &self,
        script: &ScriptDefinition,
        node: &Node,
    ) -> Result<ExecutionRecord, ShellError> {
        ensure_enabled(script)?;
        let record = self.executions.create(script, node).await?;
        self.bus.dispatch(ExecutionMessage::new(record.id)).await?;
        info!(
            "Scheduled script {} ({}) on {} as execution {}",
            script.name, script.id, node, record.id
        );
        Ok(record)
    }

    /// Drive an existing record from PENDING to a terminal state.
    ///
    /// Any failure along the way ends the record as FAILED with a diagnostic
    /// result; only a store that refuses that final write makes this return
    /// an error.
    pub async fn run_execution(
        &self,
        script: &ScriptDefinition,
        record: &mut ExecutionRecord,
    ) -> Result<(), ShellError> {
        let mut started = None;
        let Err(e) = self.run_steps(script, record, &mut started).await else {
            return Ok(());
        };

        error!(
            script_id = %script.id,
            node = %record.node,
            execution_id = %record.id,
            "Error while executing script: {}",
            e
        );
        let elapsed = started.map(|t: Instant| t.elapsed().as_secs_f64());
        record.mark_failed(format!("execution error: {}", e), elapsed);
        self.executions.save(record).await
    }

    async fn run_steps(
        &self,
        script: &ScriptDefinition,
        record: &mut ExecutionRecord,
        started: &mut Option<Instant>,
    ) -> Result<(), ShellError> {
        record.mark_running();
        self.executions.save(record).await?;

        *started = Some(Instant::now());
        let staged = StagedScript::create(&self.settings.temp_script_dir, script)?;
        let remote_path = self.remote_path(&staged);

        self.upload(script, &record.node, &staged, &remote_path).await?;
        let outcome = self.run_remote(script, &record.node, &remote_path).await?;
        self.cleanup(&record.node, &staged, &remote_path).await?;

        let elapsed = started.map_or(0.0, |t| t.elapsed().as_secs_f64());
        let status = CommandStatus::from_remote(outcome.status)?;
        if !status.is_terminal() {
            return Err(ShellError::StatusMapping(format!(
                "script run reported non-terminal status '{}'",
                status
            )));
        }
        record.mark_finished(status, outcome.output, elapsed);
        self.executions.save(record).await?;

        info!(
            "Execution {} of script {} on {} finished: {} in {:.3}s",
            record.id, script.name, record.node, status, elapsed
        );
        Ok(())
    }

    fn remote_path(&self, staged: &StagedScript) -> String {
        format!(
            "{}/{}",
            self.settings.remote_script_dir.trim_end_matches('/'),
            staged.file_name()
        )
    }

    async fn upload(
        &self,
        script: &ScriptDefinition,
        node: &Node,
        staged: &StagedScript,
        remote_path: &str,
    ) -> Result<(), ShellError> {
        let command = self.remote.create_command(
            node,
            &format!("Upload script: {}", script.name),
            &format!(
                "cat > {path} << '{eof}'\n{content}\n{eof}\nchmod +x {path}",
                path = remote_path,
                eof = staged.delimiter(),
                content = script.content
            ),
            &self.settings.remote_script_dir,
            false,
            self.settings.transfer_timeout,
        );
        debug!("Uploading script {} to {}:{}", script.id, node, remote_path);

        let result = self.remote.execute_command(&command).await?;
        if !result.is_completed() {
            return Err(ShellError::ScriptUpload(result.output));
        }
        Ok(())
    }

    async fn run_remote(
        &self,
        script: &ScriptDefinition,
        node: &Node,
        remote_path: &str,
    ) -> Result<CommandResult, ShellError> {
        let command = self.remote.create_command(
            node,
            &format!("Run script: {}", script.name),
            remote_path,
            script.effective_working_directory(),
            script.use_sudo,
            script.timeout,
        );
        self.remote.execute_command(&command).await
    }

    /// Remove the uploaded and staged copies. The remote `rm` status is not
    /// checked; failing to reach the node at all is still an error.
    async fn cleanup(
        &self,
        node: &Node,
        staged: &StagedScript,
        remote_path: &str,
    ) -> Result<(), ShellError> {
        let command = self.remote.create_command(
            node,
            "Clean up script file",
            &format!("rm -f {}", remote_path),
            &self.settings.remote_script_dir,
            false,
            self.settings.transfer_timeout,
        );
        let result = self.remote.execute_command(&command).await?;
        if !result.is_completed() {
            warn!("Cleanup of {} on {} did not complete: {}", remote_path, node, result.output.trim());
        }

        staged.remove()?;
        Ok(())
    }
}

pub(crate) fn ensure_enabled(script: &ScriptDefinition) -> Result<(), ShellError> {
    if script.enabled {
        return Ok(());
    }
    warn!("Refusing to execute disabled script {} ({})", script.name, script.id);
    Err(ShellError::ScriptDisabled {
        id: script.id,
        name: script.name.clone(),
    })
}

/// Local copy of a script's content, removed when dropped.
struct StagedScript {
    path: PathBuf,
    token: String,
}

impl StagedScript {
    fn create(dir: &Path, script: &ScriptDefinition) -> Result<Self, ShellError> {
        create_private_dir(dir)?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        let path = dir.join(format!("script_{}_{}.sh", script.id, token));
        write_private_file(&path, script.content.as_bytes())?;
        debug!("Staged script {} at {}", script.id, path.display());
        Ok(Self { path, token })
    }

    /// Heredoc terminator for the upload. Unique per attempt so no line of
    /// the script body can close the heredoc early.
    fn delimiter(&self) -> String {
        format!("SHELL_SCRIPT_{}", self.token)
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn remove(&self) -> Result<(), std::io::Error> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Drop for StagedScript {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!("Failed to remove staged script {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<(), std::io::Error> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.exists() {
        return Ok(());
    }
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o700)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    std::fs::write(path, contents)
}
