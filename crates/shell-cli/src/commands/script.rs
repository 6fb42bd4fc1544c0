use crate::dispatch::Context;
use clap::Subcommand;
use shell_core::{NewScript, ScriptDefinition, ScriptId, ScriptUpdate, ShellError};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ScriptAction {
    /// Register a new script
    Add {
        name: String,

        /// File holding the script body
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        working_directory: Option<String>,

        #[arg(long)]
        sudo: bool,

        /// Timeout in seconds (default 300)
        #[arg(short, long)]
        timeout: Option<u64>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Change fields of an existing script
    Update {
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        working_directory: Option<String>,

        #[arg(long)]
        sudo: Option<bool>,

        #[arg(short, long)]
        timeout: Option<u64>,

        /// Replaces all tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List scripts
    List {
        /// Only enabled scripts
        #[arg(short, long)]
        enabled: bool,

        /// Only scripts carrying any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        json: bool,
    },

    /// Show one script including its body
    Show { id: u64 },

    Enable { id: u64 },

    Disable { id: u64 },
}

pub async fn run(ctx: &Context, action: ScriptAction) -> anyhow::Result<()> {
    match action {
        ScriptAction::Add {
            name,
            file,
            working_directory,
            sudo,
            timeout,
            tags,
            description,
        } => {
            let content = std::fs::read_to_string(&file)?;
            let script = ctx
                .service
                .create_script(NewScript {
                    name,
                    content,
                    working_directory,
                    use_sudo: sudo,
                    timeout,
                    tags: (!tags.is_empty()).then_some(tags),
                    description,
                })
                .await?;
            println!("Script {} created: {}", script.id, script.name);
        }
        ScriptAction::Update {
            id,
            name,
            file,
            working_directory,
            sudo,
            timeout,
            tags,
            description,
        } => {
            let content = file.map(std::fs::read_to_string).transpose()?;
            let script = ctx
                .service
                .update_script(
                    ScriptId(id),
                    ScriptUpdate {
                        name,
                        content,
                        working_directory,
                        use_sudo: sudo,
                        timeout,
                        tags: (!tags.is_empty()).then_some(tags),
                        description,
                        enabled: None,
                    },
                )
                .await?;
            println!("Script {} updated: {}", script.id, script.name);
        }
        ScriptAction::List {
            enabled,
            tags,
            json,
        } => {
            let scripts = if !tags.is_empty() {
                ctx.service.find_scripts_by_tags(&tags).await?
            } else if enabled {
                ctx.service.find_enabled_scripts().await?
            } else {
                use shell_core::store::ScriptStore;
                ctx.store.as_ref().list().await?
            };
            print_scripts(&scripts, json)?;
        }
        ScriptAction::Show { id } => {
            let id = ScriptId(id);
            let script = ctx
                .service
                .find_script(id)
                .await?
                .ok_or(ShellError::ScriptNotFound(id))?;
            println!("Script:     {} ({})", script.name, script.id);
            println!("  Enabled:  {}", script.enabled);
            println!("  Dir:      {}", script.effective_working_directory());
            println!("  Sudo:     {}", script.use_sudo);
            println!("  Timeout:  {}s", script.timeout);
            if let Some(ref tags) = script.tags {
                println!("  Tags:     {}", tags.join(", "));
            }
            if let Some(ref description) = script.description {
                println!("  About:    {}", description);
            }
            println!("---");
            println!("{}", script.content);
        }
        ScriptAction::Enable { id } => set_enabled(ctx, id, true).await?,
        ScriptAction::Disable { id } => set_enabled(ctx, id, false).await?,
    }

    Ok(())
}

async fn set_enabled(ctx: &Context, id: u64, enabled: bool) -> anyhow::Result<()> {
    let script = ctx
        .service
        .update_script(
            ScriptId(id),
            ScriptUpdate {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
        .await?;
    let state = if script.enabled { "enabled" } else { "disabled" };
    println!("Script {} {}.", script.id, state);
    Ok(())
}

fn print_scripts(scripts: &[ScriptDefinition], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(scripts)?);
        return Ok(());
    }
    if scripts.is_empty() {
        println!("No scripts found.");
        return Ok(());
    }
    println!(
        "{:<6} {:<24} {:<8} {:<6} {:<8} {}",
        "ID", "NAME", "ENABLED", "SUDO", "TIMEOUT", "TAGS"
    );
    println!("{}", "-".repeat(70));
    for s in scripts {
        println!(
            "{:<6} {:<24} {:<8} {:<6} {:<8} {}",
            s.id,
            s.name,
            s.enabled,
            s.use_sudo,
            s.timeout,
            s.tags.as_ref().map(|t| t.join(", ")).unwrap_or_default(),
        );
    }
    Ok(())
}
