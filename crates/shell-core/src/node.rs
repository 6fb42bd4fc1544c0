use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A managed machine that scripts are deployed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Ssh,
    Local,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Ssh => write!(f, "ssh"),
            NodeType::Local => write!(f, "local"),
        }
    }
}

impl Node {
    /// A node that runs commands on this machine.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: NodeType::Local,
            host: None,
            port: None,
            user: None,
            key_path: None,
            labels: Vec::new(),
        }
    }

    pub fn ssh(name: impl Into<String>, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: NodeType::Ssh,
            host: Some(host.into()),
            port: None,
            user: Some(user.into()),
            key_path: None,
            labels: Vec::new(),
        }
    }

    /// Get the SSH port, falling back to 22.
    pub fn ssh_port(&self) -> u16 {
        self.port.unwrap_or(22)
    }

    /// Private key file with a leading `~/` resolved against the home directory.
    pub fn key_file(&self) -> Option<PathBuf> {
        let raw = self.key_path.as_deref()?;
        match (raw.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => Some(home.join(rest)),
            _ => Some(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
