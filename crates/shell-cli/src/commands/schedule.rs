use crate::dispatch::Context;
use shell_core::{ScriptId, ShellError};

pub async fn run(ctx: &Context, script_id: u64, node_name: &str) -> anyhow::Result<()> {
    let id = ScriptId(script_id);
    let script = ctx
        .service
        .find_script(id)
        .await?
        .ok_or(ShellError::ScriptNotFound(id))?;
    let node = ctx.node(node_name)?;

    let record = ctx.service.schedule(&script, &node).await?;

    println!("Execution {} queued:", record.id);
    println!("  Script: {} ({})", record.script_name, record.script_id);
    println!("  Node:   {}", record.node);
    println!("  Status: {}", record.status);
    println!("Run `server-shell worker` to process the queue.");

    Ok(())
}
