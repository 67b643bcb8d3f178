//! lodo CLI - offline-first todos from the command line
//!
//! Every change is committed to the local store first and pushed to Supabase
//! when a remote is configured and the `--offline` flag is not set.

mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{resolve_db_path, CliContext};
use crate::commands::config::run_config;
use crate::commands::delete::{run_delete, run_recover};
use crate::commands::edit::run_edit;
use crate::commands::list::{run_list, run_show, run_trash};
use crate::commands::sync::{run_resolve, run_sweep, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "lodo=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        db_path: resolve_db_path(cli.db_path),
        profile: cli.profile,
        offline: cli.offline,
    };

    match cli.command {
        Some(Commands::Add { title }) => run_add(&title, &ctx).await?,
        Some(Commands::List { json }) => run_list(json, &ctx).await?,
        Some(Commands::Trash { json }) => run_trash(json, &ctx).await?,
        Some(Commands::Show { id, json }) => run_show(&id, json, &ctx).await?,
        Some(Commands::Edit {
            id,
            title,
            done,
            undone,
        }) => run_edit(&id, title, done, undone, &ctx).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &ctx).await?,
        Some(Commands::Recover { id }) => run_recover(&id, &ctx).await?,
        Some(Commands::Resolve { id }) => run_resolve(&id, &ctx).await?,
        Some(Commands::Sync) => run_sync(&ctx).await?,
        Some(Commands::Sweep) => run_sweep(&ctx).await?,
        Some(Commands::Config { command }) => run_config(command, ctx.profile.as_deref())?,
        None => {
            // Quick add mode: lodo "buy milk"
            if cli.title.is_empty() {
                Cli::command().print_help()?;
                println!();
            } else {
                run_add(&cli.title, &ctx).await?;
            }
        }
    }

    Ok(())
}
