use crate::node::Node;
use crate::script::{ScriptDefinition, ScriptId};
use crate::status::CommandStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExecutionId(pub u64);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attempt to run a script on a node, with its captured outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub script_id: ScriptId,
    pub script_name: String,
    pub node: Node,
    pub status: CommandStatus,
    pub result: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    /// Seconds spent staging, uploading, running and cleaning up.
    pub execution_time: Option<f64>,
    pub exit_code: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn new(id: ExecutionId, script: &ScriptDefinition, node: &Node) -> Self {
        let now = Utc::now();
        Self {
            id,
            script_id: script.id,
            script_name: script.name.clone(),
            node: node.clone(),
            status: CommandStatus::Pending,
            result: None,
            executed_at: None,
            execution_time: None,
            exit_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        let now = Utc::now();
        self.status = CommandStatus::Running;
        self.executed_at = Some(now);
        self.updated_at = now;
    }

    /// Record the outcome reported for the script run itself.
    pub fn mark_finished(&mut self, status: CommandStatus, result: String, execution_time: f64) {
        self.status = status;
        self.result = Some(result);
        self.execution_time = Some(execution_time);
        self.exit_code = Some(exit_code_for(status));
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, message: String, execution_time: Option<f64>) {
        self.status = CommandStatus::Failed;
        self.result = Some(message);
        if execution_time.is_some() {
            self.execution_time = execution_time;
        }
        self.exit_code = Some(exit_code_for(CommandStatus::Failed));
        self.updated_at = Utc::now();
    }

    pub fn write_to_dir(&self, dir: &Path) -> Result<(), std::io::Error> {
        let path = dir.join(format!("{}.json", self.id));
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Structured JSON for `--json` output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.0,
            "script_id": self.script_id.0,
            "script": self.script_name,
            "node": self.node.name,
            "status": self.status,
            "status_label": self.status.label(),
            "result": self.result,
            "executed_at": self.executed_at.map(|t| t.to_rfc3339()),
            "execution_time": self.execution_time,
            "exit_code": self.exit_code,
            "created_at": self.created_at.to_rfc3339(),
            "updated_at": self.updated_at.to_rfc3339(),
        })
    }
}

impl fmt::Display for ExecutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.executed_at {
            Some(at) => write!(f, "{} - {}", self.script_name, at.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{} - ", self.script_name),
        }
    }
}

/// 0 for a completed run, 1 for anything else.
pub fn exit_code_for(status: CommandStatus) -> u8 {
    if status == CommandStatus::Completed {
        0
    } else {
        1
    }
}
