use crate::error::ShellError;
use crate::execution::{ExecutionId, ExecutionRecord};
use crate::node::Node;
use crate::script::{NewScript, ScriptDefinition, ScriptId};
use crate::status::CommandStatus;

/// Persistence for script definitions.
#[async_trait::async_trait]
pub trait ScriptStore: Send + Sync {
    /// Validate and store a new script, assigning its id.
    async fn create(&self, draft: NewScript) -> Result<ScriptDefinition, ShellError>;

    /// Validate and overwrite an existing script.
    async fn save(&self, script: &ScriptDefinition) -> Result<(), ShellError>;

    async fn find(&self, id: ScriptId) -> Result<Option<ScriptDefinition>, ShellError>;

    /// All scripts, newest first.
    async fn list(&self) -> Result<Vec<ScriptDefinition>, ShellError>;

    /// Enabled scripts ordered by name.
    async fn find_all_enabled(&self) -> Result<Vec<ScriptDefinition>, ShellError> {
        let mut scripts: Vec<_> = self.list().await?.into_iter().filter(|s| s.enabled).collect();
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scripts)
    }

    /// Scripts carrying at least one of `tags`, newest first.
    async fn find_by_tags(&self, tags: &[String]) -> Result<Vec<ScriptDefinition>, ShellError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|s| s.has_any_tag(tags))
            .collect())
    }
}

/// Persistence for execution records.
#[async_trait::async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Store a new PENDING record for `script` on `node`, assigning its id.
    async fn create(
        &self,
        script: &ScriptDefinition,
        node: &Node,
    ) -> Result<ExecutionRecord, ShellError>;

    async fn save(&self, record: &ExecutionRecord) -> Result<(), ShellError>;

    async fn find(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>, ShellError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ExecutionRecord>, ShellError>;

    async fn find_by_node(&self, node: &str) -> Result<Vec<ExecutionRecord>, ShellError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.node.name == node)
            .collect())
    }

    async fn find_by_script(&self, script: ScriptId) -> Result<Vec<ExecutionRecord>, ShellError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.script_id == script)
            .collect())
    }

    async fn find_by_node_and_script(
        &self,
        node: &str,
        script: ScriptId,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.node.name == node && r.script_id == script)
            .collect())
    }

    async fn find_by_status(
        &self,
        status: CommandStatus,
    ) -> Result<Vec<ExecutionRecord>, ShellError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.status == status)
            .collect())
    }
}

/// Newest first; ids break ties between records created in the same instant.
pub(crate) fn sort_newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, u64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}
