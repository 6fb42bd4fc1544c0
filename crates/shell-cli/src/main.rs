use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod dispatch;

#[derive(Parser)]
#[command(name = "server-shell")]
#[command(about = "Deploy and run shell scripts on managed server nodes", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/server-shell/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or initialise the config file
    Config {
        /// Print the config path only
        #[arg(long)]
        path: bool,

        /// Write a sample config
        #[arg(long)]
        init: bool,
    },

    /// List configured nodes
    Nodes {
        #[arg(short, long)]
        json: bool,
    },

    /// Manage script definitions
    Script {
        #[command(subcommand)]
        action: commands::script::ScriptAction,
    },

    /// Run a script on a node and wait for the result
    Run {
        /// Script id
        script: u64,

        /// Node name
        node: String,

        #[arg(short, long)]
        json: bool,
    },

    /// Queue a script run for the worker
    Schedule {
        /// Script id
        script: u64,

        /// Node name
        node: String,
    },

    /// Process queued script runs
    Worker {
        /// Keep polling the queue every N seconds
        #[arg(short, long)]
        watch: Option<u64>,
    },

    /// List execution records
    Executions {
        #[arg(short, long)]
        node: Option<String>,

        #[arg(short, long)]
        script: Option<u64>,

        /// pending, running, completed, failed, timeout or canceled
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        json: bool,
    },

    /// Show one execution record
    Status {
        /// Execution id
        id: u64,

        #[arg(short, long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<shell_core::Config> {
    match path {
        Some(p) => shell_core::Config::load_from(p),
        None => shell_core::Config::load_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Commands::Config { path, init } = cli.command {
        return commands::config::run(cli.config.as_ref(), path, init).await;
    }

    let ctx = dispatch::Context::new(load_config(cli.config.as_ref())?);

    match cli.command {
        Commands::Config { .. } => {}
        Commands::Nodes { json } => commands::nodes::run(&ctx.config, json).await?,
        Commands::Script { action } => commands::script::run(&ctx, action).await?,
        Commands::Run { script, node, json } => {
            commands::run::run(&ctx, script, &node, json).await?
        }
        Commands::Schedule { script, node } => commands::schedule::run(&ctx, script, &node).await?,
        Commands::Worker { watch } => commands::worker::run(&ctx, watch).await?,
        Commands::Executions {
            node,
            script,
            status,
            json,
        } => commands::executions::run(&ctx, node, script, status, json).await?,
        Commands::Status { id, json } => commands::status::run(&ctx, id, json).await?,
    }

    Ok(())
}
