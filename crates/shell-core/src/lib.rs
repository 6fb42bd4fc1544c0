pub mod config;
pub mod error;
pub mod execution;
pub mod file_store;
pub mod handler;
pub mod memory_store;
pub mod node;
pub mod queue;
pub mod remote;
pub mod script;
pub mod service;
pub mod status;
pub mod store;

pub use config::Config;
pub use error::ShellError;
pub use execution::{ExecutionId, ExecutionRecord};
pub use file_store::FileStore;
pub use handler::ExecutionMessageHandler;
pub use memory_store::MemoryStore;
pub use node::{Node, NodeType};
pub use queue::{ChannelBus, ExecutionMessage, MessageBus, SpoolBus};
pub use remote::{CommandResult, RemoteCommand, RemoteCommandService, RemoteStatus};
pub use script::{NewScript, ScriptDefinition, ScriptId, ScriptUpdate};
pub use service::{ServiceSettings, ShellScriptService};
pub use status::CommandStatus;
pub use store::{ExecutionStore, ScriptStore};
