//! Listing Miner command-line application.
//!
//! Thin shell over the `crates/` workspace: parses arguments, loads the
//! configuration, opens the store and prints command results as JSON.

pub mod cli;
pub mod commands;
pub mod state;

pub use cli::{Cli, Command};

use anyhow::Result;
use miner_core::AppConfig;
use miner_db::SearchParams;
use miner_scraper::ScrapeRequest;
use serde::Serialize;
use state::AppState;
use tracing::info;

/// Initialize tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,miner=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_with_env(cli.config.as_deref())?;
    info!("Starting Listing Miner v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scrape {
            source,
            kind,
            region,
            start_page,
            max_pages,
            workers,
            wait,
        } => {
            let mut config = config;
            if let Some(workers) = workers {
                config.scraping.workers = workers;
                config.validate()?;
            }
            let state = AppState::open(config).await?;
            let request = ScrapeRequest {
                source,
                kind,
                region,
                start_page,
                max_pages,
            };

            if wait {
                let job = commands::scrape::scrape_and_wait(&state, request).await?;
                print_json(&job)
            } else {
                // The job runs inside this process, so it is followed to the end
                let orchestrator = state.orchestrator()?;
                let handle = commands::scrape::start_scrape(&orchestrator, request).await?;
                println!("{}", handle.job_id());
                let job = commands::scrape::follow_job(&orchestrator, handle).await?;
                info!(
                    job_id = %job.id,
                    status = %job.status,
                    saved = job.records_saved,
                    "scrape job finished"
                );
                Ok(())
            }
        }
        Command::Job { id } => {
            let state = AppState::open(config).await?;
            print_json(&commands::scrape::get_job(&state, &id).await?)
        }
        Command::Jobs { limit } => {
            let state = AppState::open(config).await?;
            print_json(&commands::scrape::list_jobs(&state, limit).await?)
        }
        Command::List { offset, limit } => {
            let state = AppState::open(config).await?;
            print_json(&commands::listings::list(&state, offset, limit).await?)
        }
        Command::Get { id } => {
            let state = AppState::open(config).await?;
            print_json(&commands::listings::get(&state, id).await?)
        }
        Command::Update { id, file } => {
            let state = AppState::open(config).await?;
            let record = commands::listings::read_record(&file)?;
            print_json(&commands::listings::update(&state, id, &record).await?)
        }
        Command::Count => {
            let state = AppState::open(config).await?;
            println!("{}", commands::listings::count(&state).await?);
            Ok(())
        }
        Command::Search {
            city,
            neighborhood,
            min_price,
            max_price,
        } => {
            let state = AppState::open(config).await?;
            let params = SearchParams {
                city,
                neighborhood,
                min_price,
                max_price,
            };
            print_json(&commands::listings::search(&state, &params).await?)
        }
        Command::Delete { id } => {
            let state = AppState::open(config).await?;
            commands::listings::delete(&state, id).await?;
            info!(id, "listing deleted");
            Ok(())
        }
        Command::Purge { yes } => {
            let state = AppState::open(config).await?;
            let deleted = commands::listings::purge(&state, yes).await?;
            println!("{deleted}");
            Ok(())
        }
        Command::Export {
            city,
            neighborhood,
            kind,
        } => {
            let state = AppState::open(config).await?;
            let filter = commands::export::build_filter(city, neighborhood, kind);
            print_json(&commands::export::export(&state, &filter).await?)
        }
        Command::Sources => {
            let state = AppState::open(config).await?;
            for name in commands::scrape::sources(&state)? {
                println!("{name}");
            }
            Ok(())
        }
    }
}
