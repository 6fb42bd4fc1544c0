use shell_core::config::Config;
use shell_core::error::ShellError;
use shell_core::node::{Node, NodeType};
use shell_core::remote::{CommandResult, RemoteCommand, RemoteCommandService};
use shell_core::store::{ExecutionStore, ScriptStore};
use shell_core::{ExecutionMessageHandler, FileStore, ServiceSettings, ShellScriptService, SpoolBus};
use shell_local::LocalCommandService;
use shell_ssh::SshCommandService;
use std::sync::Arc;

/// Routes each command to the transport matching its node's type.
#[derive(Default)]
pub struct NodeRouter {
    ssh: SshCommandService,
    local: LocalCommandService,
}

#[async_trait::async_trait]
impl RemoteCommandService for NodeRouter {
    async fn execute_command(&self, command: &RemoteCommand) -> Result<CommandResult, ShellError> {
        match command.node.node_type {
            NodeType::Ssh => self.ssh.execute_command(command).await,
            NodeType::Local => self.local.execute_command(command).await,
        }
    }
}

/// Everything a command needs, wired from the config.
pub struct Context {
    pub config: Config,
    pub service: Arc<ShellScriptService>,
    pub store: Arc<FileStore>,
    pub spool: Arc<SpoolBus>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(FileStore::new(config.scripts_dir(), config.executions_dir()));
        let spool = Arc::new(SpoolBus::new(config.spool_dir()));
        let service = ShellScriptService::new(
            Arc::new(NodeRouter::default()),
            store.clone(),
            store.clone(),
            spool.clone(),
        )
        .with_settings(ServiceSettings::from(&config.defaults));

        Self {
            config,
            service: Arc::new(service),
            store,
            spool,
        }
    }

    pub fn handler(&self) -> ExecutionMessageHandler {
        let scripts: Arc<dyn ScriptStore> = self.store.clone();
        let executions: Arc<dyn ExecutionStore> = self.store.clone();
        ExecutionMessageHandler::new(self.service.clone(), scripts, executions)
    }

    pub fn node(&self, name: &str) -> Result<Node, ShellError> {
        self.config
            .find_node(name)
            .cloned()
            .ok_or_else(|| ShellError::NodeNotFound(name.to_string()))
    }
}
