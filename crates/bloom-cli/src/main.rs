//! Bloom CLI - keep diary drafts safe and submit finished entries
//!
//! Drafts live in a local libSQL file; submission talks to the diary backend
//! configured through `BLOOM_API_BASE_URL`.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands, DraftCommands};
use crate::commands::common::{load_config, resolve_db_path};
use crate::commands::draft::{run_draft_delete, run_draft_list, run_draft_save, run_draft_show};
use crate::commands::open::run_open;
use crate::commands::submit::{run_submit, SubmitInput};
use crate::commands::sweep::run_sweep;
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

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "bloom=info".parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.command)?;
    let db_path = resolve_db_path(cli.db_path, &config)?;

    match cli.command {
        Commands::Draft { command } => match command {
            DraftCommands::Save { date, fields } => {
                run_draft_save(date, &fields, &db_path).await?;
            }
            DraftCommands::Show { date, json } => run_draft_show(date, json, &db_path).await?,
            DraftCommands::Delete { date } => run_draft_delete(date, &db_path).await?,
            DraftCommands::List { json } => run_draft_list(json, &db_path).await?,
        },
        Commands::Sweep { days } => {
            run_sweep(days.unwrap_or(config.retention_days), &db_path).await?;
        }
        Commands::Open { date, accept } => {
            run_open(date, accept, &config, &db_path).await?;
        }
        Commands::Submit {
            date,
            status,
            fields,
            image,
            from_draft,
        } => {
            let input = SubmitInput {
                date,
                status: status.into(),
                fields: &fields,
                image: image.as_deref(),
                from_draft,
            };
            run_submit(input, &config, &db_path).await?;
        }
    }

    Ok(())
}
