use crate::error::ShellError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_CONTENT_LEN: usize = 65535;
pub const MAX_WORKING_DIRECTORY_LEN: usize = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WORKING_DIRECTORY: &str = "/tmp";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ScriptId(pub u64);

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_enabled() -> bool {
    true
}

/// A stored, reusable shell script plus its execution policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptDefinition {
    pub id: ScriptId,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub use_sudo: bool,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScriptDefinition {
    /// Build a definition from a draft. The store assigns `id`.
    pub fn from_draft(id: ScriptId, draft: NewScript) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name,
            content: draft.content,
            working_directory: draft.working_directory,
            use_sudo: draft.use_sudo,
            timeout: draft.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            enabled: true,
            tags: draft.tags,
            description: draft.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Directory the script runs in on the node.
    pub fn effective_working_directory(&self) -> &str {
        match self.working_directory.as_deref() {
            Some(dir) if !dir.is_empty() => dir,
            _ => DEFAULT_WORKING_DIRECTORY,
        }
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|own| own.iter().any(|t| tags.contains(t)))
    }

    pub fn validate(&self) -> Result<(), ShellError> {
        if self.name.trim().is_empty() {
            return Err(ShellError::Validation("name must not be blank".into()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(ShellError::Validation(format!(
                "name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.content.trim().is_empty() {
            return Err(ShellError::Validation("content must not be blank".into()));
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(ShellError::Validation(format!(
                "content exceeds {} characters",
                MAX_CONTENT_LEN
            )));
        }
        if let Some(dir) = &self.working_directory {
            if dir.chars().count() > MAX_WORKING_DIRECTORY_LEN {
                return Err(ShellError::Validation(format!(
                    "working directory exceeds {} characters",
                    MAX_WORKING_DIRECTORY_LEN
                )));
            }
        }
        if self.timeout == 0 {
            return Err(ShellError::Validation("timeout must be positive".into()));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_CONTENT_LEN {
                return Err(ShellError::Validation(format!(
                    "description exceeds {} characters",
                    MAX_CONTENT_LEN
                )));
            }
        }
        Ok(())
    }

    /// Apply a partial update. Only fields set on `update` change.
    pub fn apply(&mut self, update: ScriptUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(dir) = update.working_directory {
            self.working_directory = Some(dir);
        }
        if let Some(use_sudo) = update.use_sudo {
            self.use_sudo = use_sudo;
        }
        if let Some(timeout) = update.timeout {
            self.timeout = timeout;
        }
        if let Some(tags) = update.tags {
            self.tags = Some(tags);
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
    }
}

impl fmt::Display for ScriptDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Fields for a script that has not been stored yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewScript {
    pub name: String,
    pub content: String,
    pub working_directory: Option<String>,
    pub use_sudo: bool,
    pub timeout: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
}

impl NewScript {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub working_directory: Option<String>,
    pub use_sudo: Option<bool>,
    pub timeout: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}
