use crate::domain::StandingsRow;
use crate::error::Result;

/// Persistence consumed by the refresh policy. The policy is the only writer.
pub trait Storage: Send + Sync {
    /// Current snapshot ordered by position.
    fn load_standings(&self) -> Result<Vec<StandingsRow>>;
    fn clear_standings(&self) -> Result<()>;
    fn insert_standings(&self, rows: &[StandingsRow]) -> Result<()>;
    fn load_setting(&self, key: &str) -> Result<Option<String>>;
    fn save_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Swap the stored snapshot for `rows`. Stores that can do this atomically
    /// should override it; the default leaves a window where the table is empty.
    fn replace_standings(&self, rows: &[StandingsRow]) -> Result<()> {
        self.clear_standings()?;
        self.insert_standings(rows)
    }
}

pub struct StorageKeys;

impl StorageKeys {
    pub const STANDINGS: &'static str = "league_standings";
    pub const SETTINGS: &'static str = "settings";

    pub const LAST_SCRAPE: &'static str = "league_table_last_scrape";
}
