use crate::error::ShellError;
use crate::execution::{ExecutionId, ExecutionRecord};
use crate::node::Node;
use crate::script::{NewScript, ScriptDefinition, ScriptId};
use crate::store::{sort_newest_first, ExecutionStore, ScriptStore};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

/// Store keeping one pretty-printed JSON document per entity:
///   <root>/scripts/<id>.json
///   <root>/executions/<id>.json
pub struct FileStore {
    scripts_dir: PathBuf,
    executions_dir: PathBuf,
    // Serializes id allocation and writes within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(scripts_dir: PathBuf, executions_dir: PathBuf) -> Self {
        Self {
            scripts_dir,
            executions_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn open(root: &Path) -> Self {
        Self::new(root.join("scripts"), root.join("executions"))
    }

    fn script_path(&self, id: ScriptId) -> PathBuf {
        self.scripts_dir.join(format!("{}.json", id))
    }

    fn execution_path(&self, id: ExecutionId) -> PathBuf {
        self.executions_dir.join(format!("{}.json", id))
    }

    fn write_script(&self, script: &ScriptDefinition) -> Result<(), ShellError> {
        std::fs::create_dir_all(&self.scripts_dir)?;
        let json = serde_json::to_string_pretty(script)?;
        std::fs::write(self.script_path(script.id), json)?;
        Ok(())
    }

    fn write_execution(&self, record: &ExecutionRecord) -> Result<(), ShellError> {
        std::fs::create_dir_all(&self.executions_dir)?;
        record.write_to_dir(&self.executions_dir)?;
        Ok(())
    }
}

/// Largest numeric file stem in `dir`, or 0 when there is none.
fn max_id(dir: &Path) -> Result<u64, std::io::Error> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut max = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                max = max.max(id);
            }
        }
    }
    Ok(max)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ShellError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

/// Read every document in `dir`, skipping files that fail to parse.
fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, ShellError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut results = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match read_json::<T>(&path) {
            Ok(Some(item)) => results.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable document {}: {}", path.display(), e),
        }
    }
    Ok(results)
}

#[async_trait::async_trait]
impl ScriptStore for FileStore {
    async fn create(&self, draft: NewScript) -> Result<ScriptDefinition, ShellError> {
        let _guard = self.lock.lock().await;
        let next = max_id(&self.scripts_dir)? + 1;
        let script = ScriptDefinition::from_draft(ScriptId(next), draft);
        script.validate()?;
        self.write_script(&script)?;
        Ok(script)
    }

    async fn save(&self, script: &ScriptDefinition) -> Result<(), ShellError> {
        script.validate()?;
        let _guard = self.lock.lock().await;
        if !self.script_path(script.id).exists() {
            return Err(ShellError::ScriptNotFound(script.id));
        }
        let mut stored = script.clone();
        stored.updated_at = Utc::now();
        self.write_script(&stored)
    }

    async fn find(&self, id: ScriptId) -> Result<Option<ScriptDefinition>, ShellError> {
        read_json(&self.script_path(id))
    }

    async fn list(&self) -> Result<Vec<ScriptDefinition>, ShellError> {
        let mut scripts: Vec<ScriptDefinition> = read_all(&self.scripts_dir)?;
        sort_newest_first(&mut scripts, |s| (s.created_at, s.id.0));
        Ok(scripts)
    }
}

#[async_trait::async_trait]
impl ExecutionStore for FileStore {
    async fn create(
        &self,
        script: &ScriptDefinition,
        node: &Node,
    ) -> Result<ExecutionRecord, ShellError> {
        let _guard = self.lock.lock().await;
        let next = max_id(&self.executions_dir)? + 1;
        let record = ExecutionRecord::new(ExecutionId(next), script, node);
        self.write_execution(&record)?;
        Ok(record)
    }

    async fn save(&self, record: &ExecutionRecord) -> Result<(), ShellError> {
        let _guard = self.lock.lock().await;
        if !self.execution_path(record.id).exists() {
            return Err(ShellError::ExecutionNotFound(record.id));
        }
        self.write_execution(record)
    }

    async fn find(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>, ShellError> {
        read_json(&self.execution_path(id))
    }

    async fn list(&self) -> Result<Vec<ExecutionRecord>, ShellError> {
        let mut records: Vec<ExecutionRecord> = read_all(&self.executions_dir)?;
        sort_newest_first(&mut records, |r| (r.created_at, r.id.0));
        Ok(records)
    }
}
