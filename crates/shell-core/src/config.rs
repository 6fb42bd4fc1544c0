use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
/// Loaded from ~/.config/server-shell/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Local directory scripts are staged in before upload.
    #[serde(default = "default_temp_script_dir")]
    pub temp_script_dir: PathBuf,
    /// Directory on the node that uploaded scripts are written to.
    #[serde(default = "default_remote_script_dir")]
    pub remote_script_dir: String,
    /// Timeout in seconds for the upload and cleanup commands.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout: u64,
    /// Where the CLI keeps scripts, execution records and queued jobs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            temp_script_dir: default_temp_script_dir(),
            remote_script_dir: default_remote_script_dir(),
            transfer_timeout: default_transfer_timeout(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_temp_script_dir() -> PathBuf {
    PathBuf::from("/tmp/shell_scripts")
}

fn default_remote_script_dir() -> String {
    "/tmp".to_string()
}

fn default_transfer_timeout() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("server-shell")
}

impl Config {
    /// Load config from the default path, or an empty config if there is none.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::empty())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("server-shell")
            .join("config.yaml")
    }

    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            defaults: Defaults::default(),
        }
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Find nodes carrying all given labels.
    pub fn find_by_labels(&self, labels: &[String]) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| labels.iter().all(|l| n.labels.contains(l)))
            .collect()
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.defaults.data_dir.join("scripts")
    }

    pub fn executions_dir(&self) -> PathBuf {
        self.defaults.data_dir.join("executions")
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.defaults.data_dir.join("queue")
    }
}
