use crate::api::TriggerRequest;
use crate::config::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::{FileSystemStore, HtmlFetcher};
use crate::services::league_table::LeagueTableService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod domain;
mod error;
mod infrastructure;
mod scrapers;
mod services;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.args.log_level)),
        )
        .init();
    api::install_panic_hook();

    config.ensure_directories()?;

    let store = Arc::new(FileSystemStore::new(&config.args.data_dir));
    let fetcher = Arc::new(HtmlFetcher::new(&config.scraper_config)?);
    info!("League page: {}", fetcher.url());

    let service = Arc::new(LeagueTableService::new(
        &config.scraper_config,
        store,
        fetcher,
    )?);

    match config.args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            let listener = TcpListener::bind(config.args.bind.as_str()).await?;
            info!("Listening on {}", listener.local_addr()?);
            axum::serve(listener, api::router(service)).await?;
        }
        Command::Scrape { force_refresh } => {
            let request = TriggerRequest {
                force_refresh,
                action: None,
            };
            print_response(api::handle(&service, request).await)?;
        }
        Command::Status => {
            let request = TriggerRequest {
                force_refresh: false,
                action: Some(api::STATUS_CHECK.to_string()),
            };
            print_response(api::handle(&service, request).await)?;
        }
    }

    Ok(())
}

fn print_response(response: api::ApiResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        return Err(error::LeagueError::Other(format!(
            "request failed with HTTP {}",
            response.status
        )));
    }
    Ok(())
}
