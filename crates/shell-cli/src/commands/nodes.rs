use shell_core::config::Config;

pub async fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    if config.nodes.is_empty() {
        println!("No nodes configured.");
        println!("Run `server-shell config --init` to create a sample config.");
        return Ok(());
    }

    if json {
        let entries: Vec<serde_json::Value> = config
            .nodes
            .iter()
            .map(|n| {
                serde_json::json!({
                    "name": n.name,
                    "type": n.node_type.to_string(),
                    "host": n.host,
                    "labels": n.labels,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{:<15} {:<8} {:<20} {}", "NAME", "TYPE", "HOST", "LABELS");
        println!("{}", "-".repeat(60));
        for n in &config.nodes {
            println!(
                "{:<15} {:<8} {:<20} {}",
                n.name,
                n.node_type,
                n.host.as_deref().unwrap_or("-"),
                n.labels.join(", "),
            );
        }
    }

    Ok(())
}
