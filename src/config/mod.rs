use crate::config::cli::Args;
use crate::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub(crate) mod cli;

pub const DEFAULT_URL: &str = "https://www.highlandfootballleague.com/leaguetable/";

/// Advisory validation thresholds. Kept out of the validator so rule changes
/// (bonus points, shorter form windows) only need a config edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationThresholds {
    pub points_tolerance: i32,
    pub max_form_len: usize,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            points_tolerance: 3,
            max_form_len: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub min_body_len: usize,
    pub cache_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub table_selectors: Vec<String>,
    pub validation: ValidationThresholds,
    /// Last-resort team names by league position.
    pub fallback_teams: BTreeMap<u32, String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_ms: 10_000,
            min_body_len: 1000,
            cache_timeout_secs: 6 * 60 * 60,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-GB,en;q=0.9".to_string(),
            table_selectors: default_table_selectors(),
            validation: ValidationThresholds::default(),
            fallback_teams: highland_league_fallback(),
        }
    }
}

impl ScraperConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        info!("Loaded scraper config from {}", path.display());
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_timeout_secs as i64)
    }
}

fn default_table_selectors() -> Vec<String> {
    [
        "table.league-table__table",
        "table.standings",
        ".league-table table",
        "table",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn highland_league_fallback() -> BTreeMap<u32, String> {
    [
        "Brechin City",
        "Buckie Thistle",
        "Banks o' Dee",
        "Formartine United",
        "Fraserburgh",
        "Inverurie Loco Works",
        "Brora Rangers",
        "Nairn County",
        "Clachnacuddin",
        "Forres Mechanics",
        "Keith",
        "Huntly",
        "Deveronvale",
        "Wick Academy",
        "Turriff United",
        "Lossiemouth",
        "Rothes",
        "Strathspey Thistle",
    ]
    .into_iter()
    .enumerate()
    .map(|(i, name)| (i as u32 + 1, name.to_string()))
    .collect()
}

pub struct Config {
    pub args: Args,
    pub scraper_config: ScraperConfig,
}

impl Config {
    pub fn new() -> Result<Self> {
        let args = Args::parse();
        let scraper_config = ScraperConfig::load(&args.config_file)?;

        Ok(Self {
            args,
            scraper_config,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if !self.args.data_dir.exists() {
            std::fs::create_dir_all(&self.args.data_dir)?;
        }

        info!("Data dir exists");
        Ok(())
    }
}
