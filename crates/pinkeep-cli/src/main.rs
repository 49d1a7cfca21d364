//! Pinkeep CLI - browse and manage Pinboard bookmarks from the terminal
//!
//! Reads go through a local cache that is refreshed when the remote changed.

mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, AddArgs};
use crate::commands::clear_cache::run_clear_cache;
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::get::run_get;
use crate::commands::list::{run_list, ListArgs};
use crate::commands::share::run_share;
use crate::commands::suggest::run_suggest;
use crate::commands::sync::run_sync;
use crate::commands::tags::run_tags;
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

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "pinkeep=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.db_path, cli.profile, cli.offline);

    match cli.command {
        Some(Commands::List {
            search,
            tags,
            untagged,
            visibility,
            read_later,
            oldest,
            limit,
            offset,
            json,
        }) => {
            let args = ListArgs {
                search,
                tags,
                untagged,
                visibility,
                read_later,
                oldest,
                limit,
                offset,
            };
            run_list(&args, json, &ctx).await?;
        }
        Some(Commands::Add {
            url,
            title,
            description,
            tags,
            private,
            public,
            read_later,
            read,
            no_replace,
            json,
        }) => {
            let args = AddArgs {
                url,
                title,
                description,
                tags,
                private,
                public,
                read_later,
                read,
                no_replace,
            };
            run_add(&args, json, &ctx).await?;
        }
        Some(Commands::Share { text, json }) => run_share(&text, json, &ctx).await?,
        Some(Commands::Delete { url }) => run_delete(&url, &ctx).await?,
        Some(Commands::Get { url, json }) => run_get(&url, json, &ctx).await?,
        Some(Commands::Tags { prefix, json }) => run_tags(prefix.as_deref(), json, &ctx).await?,
        Some(Commands::Suggest { url, json }) => run_suggest(&url, json, &ctx).await?,
        Some(Commands::Sync) => run_sync(&ctx).await?,
        Some(Commands::ClearCache) => run_clear_cache(&ctx).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, &ctx).await?,
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
