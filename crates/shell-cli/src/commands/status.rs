use crate::commands::print_execution;
use crate::dispatch::Context;
use shell_core::{ExecutionId, ShellError};

pub async fn run(ctx: &Context, id: u64, json: bool) -> anyhow::Result<()> {
    let id = ExecutionId(id);
    let record = ctx
        .service
        .find_execution(id)
        .await?
        .ok_or(ShellError::ExecutionNotFound(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.to_json())?);
    } else {
        print_execution(&record);
    }

    Ok(())
}
