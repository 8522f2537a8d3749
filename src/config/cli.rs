use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to scraper configuration file (defaults are used when missing)
    #[arg(long, default_value = "scraper_config.json")]
    pub config_file: PathBuf,

    /// Directory holding the stored snapshot and settings
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Address the HTTP trigger interface listens on
    #[arg(long, env = "LEAGUE_TABLE_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the league table over HTTP
    Serve,
    /// Run one scrape-or-serve cycle and print the response
    Scrape {
        /// Ignore the staleness window and scrape now
        #[arg(long)]
        force_refresh: bool,
    },
    /// Print the liveness payload without touching network or store
    Status,
}
