use crate::commands::print_execution;
use crate::dispatch::Context;
use shell_core::{ScriptId, ShellError};

pub async fn run(ctx: &Context, script_id: u64, node_name: &str, json: bool) -> anyhow::Result<()> {
    let id = ScriptId(script_id);
    let script = ctx
        .service
        .find_script(id)
        .await?
        .ok_or(ShellError::ScriptNotFound(id))?;
    let node = ctx.node(node_name)?;

    let record = ctx.service.execute(&script, &node).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.to_json())?);
    } else {
        print_execution(&record);
    }

    Ok(())
}
