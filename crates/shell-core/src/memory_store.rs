use crate::error::ShellError;
use crate::execution::{ExecutionId, ExecutionRecord};
use crate::node::Node;
use crate::script::{NewScript, ScriptDefinition, ScriptId};
use crate::store::{sort_newest_first, ExecutionStore, ScriptStore};
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process store for scripts and execution records.
#[derive(Default)]
pub struct MemoryStore {
    scripts: RwLock<BTreeMap<ScriptId, ScriptDefinition>>,
    executions: RwLock<BTreeMap<ExecutionId, ExecutionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ScriptStore for MemoryStore {
    async fn create(&self, draft: NewScript) -> Result<ScriptDefinition, ShellError> {
        let mut scripts = self.scripts.write().await;
        let next = scripts.keys().next_back().map_or(1, |id| id.0 + 1);
        let script = ScriptDefinition::from_draft(ScriptId(next), draft);
        script.validate()?;
        scripts.insert(script.id, script.clone());
        Ok(script)
    }

    async fn save(&self, script: &ScriptDefinition) -> Result<(), ShellError> {
        script.validate()?;
        let mut scripts = self.scripts.write().await;
        if !scripts.contains_key(&script.id) {
            return Err(ShellError::ScriptNotFound(script.id));
        }
        let mut stored = script.clone();
        stored.updated_at = Utc::now();
        scripts.insert(stored.id, stored);
        Ok(())
    }

    async fn find(&self, id: ScriptId) -> Result<Option<ScriptDefinition>, ShellError> {
        Ok(self.scripts.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ScriptDefinition>, ShellError> {
        let mut scripts: Vec<_> = self.scripts.read().await.values().cloned().collect();
        sort_newest_first(&mut scripts, |s| (s.created_at, s.id.0));
        Ok(scripts)
    }
}

#[async_trait::async_trait]
impl ExecutionStore for MemoryStore {
    async fn create(
        &self,
        script: &ScriptDefinition,
        node: &Node,
    ) -> Result<ExecutionRecord, ShellError> {
        let mut executions = self.executions.write().await;
        let next = executions.keys().next_back().map_or(1, |id| id.0 + 1);
        let record = ExecutionRecord::new(ExecutionId(next), script, node);
        executions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, record: &ExecutionRecord) -> Result<(), ShellError> {
        let mut executions = self.executions.write().await;
        if !executions.contains_key(&record.id) {
            return Err(ShellError::ExecutionNotFound(record.id));
        }
        executions.insert(record.id, record.clone());
        Ok(())
    }

    async fn find(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>, ShellError> {
        Ok(self.executions.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ExecutionRecord>, ShellError> {
        let mut records: Vec<_> = self.executions.read().await.values().cloned().collect();
        sort_newest_first(&mut records, |r| (r.created_at, r.id.0));
        Ok(records)
    }
}
