#![allow(dead_code)]

use shell_core::error::ShellError;
use shell_core::execution::{ExecutionId, ExecutionRecord};
use shell_core::node::Node;
use shell_core::queue::{ExecutionMessage, MessageBus};
use shell_core::remote::{CommandResult, RemoteCommand, RemoteCommandService, RemoteStatus};
use shell_core::script::{NewScript, ScriptDefinition};
use shell_core::service::{ServiceSettings, ShellScriptService};
use shell_core::store::{ExecutionStore, ScriptStore};
use shell_core::MemoryStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// What the scripted remote answers for one kind of command.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(Option<RemoteStatus>, String),
    Error(String),
}

impl Reply {
    pub fn completed(output: &str) -> Self {
        Reply::Status(Some(RemoteStatus::Completed), output.to_string())
    }

    pub fn status(status: RemoteStatus, output: &str) -> Self {
        Reply::Status(Some(status), output.to_string())
    }
}

/// Remote command service answering upload, run and cleanup commands with
/// canned replies and remembering every command it was given.
pub struct ScriptedRemote {
    pub upload: Reply,
    pub run: Reply,
    pub cleanup: Reply,
    commands: Mutex<Vec<RemoteCommand>>,
}

impl ScriptedRemote {
    pub fn new(upload: Reply, run: Reply, cleanup: Reply) -> Self {
        Self {
            upload,
            run,
            cleanup,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Every command completes; the run step prints `output`.
    pub fn succeeding(output: &str) -> Self {
        Self::new(Reply::completed(""), Reply::completed(output), Reply::completed(""))
    }

    pub fn with_run(run: Reply) -> Self {
        Self::new(Reply::completed(""), run, Reply::completed(""))
    }

    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RemoteCommandService for ScriptedRemote {
    async fn execute_command(&self, command: &RemoteCommand) -> Result<CommandResult, ShellError> {
        self.commands.lock().unwrap().push(command.clone());
        let reply = if command.name.starts_with("Upload script") {
            &self.upload
        } else if command.name.starts_with("Run script") {
            &self.run
        } else {
            &self.cleanup
        };
        match reply {
            Reply::Status(status, output) => Ok(CommandResult {
                status: *status,
                output: output.clone(),
            }),
            Reply::Error(message) => Err(ShellError::SshConnection(message.clone())),
        }
    }
}

#[derive(Default)]
pub struct RecordingBus {
    messages: Mutex<Vec<ExecutionMessage>>,
}

impl RecordingBus {
    pub fn messages(&self) -> Vec<ExecutionMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MessageBus for RecordingBus {
    async fn dispatch(&self, message: ExecutionMessage) -> Result<(), ShellError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct Harness {
    pub remote: Arc<ScriptedRemote>,
    pub store: Arc<MemoryStore>,
    pub bus: Arc<RecordingBus>,
    pub service: Arc<ShellScriptService>,
    pub temp: TempDir,
}

impl Harness {
    pub fn new(remote: ScriptedRemote) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let remote = Arc::new(remote);
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(RecordingBus::default());
        let settings = ServiceSettings {
            temp_script_dir: temp.path().join("shell_scripts"),
            remote_script_dir: "/tmp".to_string(),
            transfer_timeout: 30,
        };
        let service = ShellScriptService::new(remote.clone(), store.clone(), store.clone(), bus.clone())
            .with_settings(settings);
        Self {
            remote,
            store,
            bus,
            service: Arc::new(service),
            temp,
        }
    }

    pub fn scripts(&self) -> Arc<dyn ScriptStore> {
        self.store.clone()
    }

    pub fn executions(&self) -> Arc<dyn ExecutionStore> {
        self.store.clone()
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.temp.path().join("shell_scripts")
    }

    /// Files left behind in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.staging_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn script(&self, draft: NewScript) -> ScriptDefinition {
        self.service.create_script(draft).await.unwrap()
    }

    pub async fn record(&self, id: ExecutionId) -> ExecutionRecord {
        self.executions().find(id).await.unwrap().unwrap()
    }

    pub async fn all_records(&self) -> Vec<ExecutionRecord> {
        self.executions().list().await.unwrap()
    }
}

pub fn echo_hi() -> NewScript {
    NewScript {
        timeout: Some(30),
        ..NewScript::new("say hi", "echo hi")
    }
}

pub fn node() -> Node {
    Node::ssh("web-1", "10.0.0.5", "deploy")
}
