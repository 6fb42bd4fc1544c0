use crate::dispatch::Context;
use std::time::Duration;
use tracing::info;

pub async fn run(ctx: &Context, watch: Option<u64>) -> anyhow::Result<()> {
    let handler = ctx.handler();
    info!("Draining queue at {}", ctx.spool.dir().display());

    match watch {
        Some(interval) => loop {
            ctx.spool.drain(&handler).await?;
            tokio::time::sleep(Duration::from_secs(interval)).await;
        },
        None => {
            let processed = ctx.spool.drain(&handler).await?;
            println!("Processed {} queued execution(s).", processed);
        }
    }

    Ok(())
}
