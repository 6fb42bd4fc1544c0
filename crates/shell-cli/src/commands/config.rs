use shell_core::Config;
use std::path::PathBuf;

const SAMPLE_CONFIG: &str = r#"# server-shell configuration

nodes:
  - name: web-1
    type: ssh
    host: 192.168.0.10
    user: deploy
    key_path: ~/.ssh/id_ed25519
    labels:
      - web
      - production

  - name: local
    type: local
    labels:
      - dev

defaults:
  temp_script_dir: /tmp/shell_scripts
  remote_script_dir: /tmp
  transfer_timeout: 30
"#;

pub async fn run(custom: Option<&PathBuf>, path: bool, init: bool) -> anyhow::Result<()> {
    let config_path = custom.cloned().unwrap_or_else(Config::default_path);

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config already exists at: {}", config_path.display());
            println!("Remove it first if you want to reinitialize.");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, SAMPLE_CONFIG)?;
        println!("Sample config written to: {}", config_path.display());
        return Ok(());
    }

    println!("Config path: {}", config_path.display());
    if config_path.exists() {
        let config = Config::load_from(&config_path)?;
        println!("Nodes:       {}", config.nodes.len());
        for n in &config.nodes {
            println!("  - {} ({})", n.name, n.node_type);
        }
        println!("Data dir:    {}", config.defaults.data_dir.display());
    } else {
        println!("Status:      not found");
        println!("Run `server-shell config --init` to create one.");
    }

    Ok(())
}
