use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Selector error: {0}")]
    Selector(String),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("No league table found in page")]
    NoTableFound,
    #[error("Scrape rejected: {0}")]
    Rejected(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("{0}")]
    Other(String),
}

/// Categorized failures of a single page fetch. All of them leave the
/// stored snapshot untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("upstream responded with HTTP {0}")]
    HttpStatus(u16),
    #[error("response body suspiciously short ({0} bytes)")]
    SuspiciouslyShort(usize),
}

impl LeagueError {
    /// Short machine-friendly category used in failure responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LeagueError::Network(_) => "network",
            LeagueError::Io(_) => "io",
            LeagueError::Serialization(_) => "serialization",
            LeagueError::Selector(_) => "selector",
            LeagueError::Fetch(FetchError::Timeout(_)) => "timeout",
            LeagueError::Fetch(FetchError::HttpStatus(_)) => "http_status",
            LeagueError::Fetch(FetchError::SuspiciouslyShort(_)) => "suspiciously_short",
            LeagueError::NoTableFound => "no_table_found",
            LeagueError::Rejected(_) => "rejected",
            LeagueError::Store(_) => "store",
            LeagueError::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, LeagueError>;
