use crate::dispatch::Context;
use shell_core::store::ExecutionStore;
use shell_core::{CommandStatus, ScriptId};

pub async fn run(
    ctx: &Context,
    node_filter: Option<String>,
    script_filter: Option<u64>,
    status_filter: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let store: &dyn ExecutionStore = ctx.store.as_ref();
    let mut records = match (&node_filter, script_filter) {
        (Some(node), Some(script)) => {
            store.find_by_node_and_script(node, ScriptId(script)).await?
        }
        (Some(node), None) => store.find_by_node(node).await?,
        (None, Some(script)) => store.find_by_script(ScriptId(script)).await?,
        (None, None) => store.list().await?,
    };

    if let Some(ref token) = status_filter {
        let status: CommandStatus = token.parse()?;
        records.retain(|r| r.status == status);
    }

    if json {
        let entries: Vec<_> = records.iter().map(|r| r.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No executions found.");
        return Ok(());
    }
    println!(
        "{:<6} {:<24} {:<15} {:<10} {:<6} {}",
        "ID", "SCRIPT", "NODE", "STATUS", "EXIT", "EXECUTED"
    );
    println!("{}", "-".repeat(90));
    for r in &records {
        println!(
            "{:<6} {:<24} {:<15} {:<10} {:<6} {}",
            r.id,
            r.script_name,
            r.node.name,
            r.status,
            r.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
            r.executed_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }

    Ok(())
}
