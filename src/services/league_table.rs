use crate::config::ScraperConfig;
use crate::domain::storage::{Storage, StorageKeys};
use crate::domain::StandingsRow;
use crate::error::{LeagueError, Result};
use crate::infrastructure::PageFetcher;
use crate::scrapers::LeagueTableScraper;
use crate::services::validation::{ValidationWarning, Validator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Fresh,
    Stale,
}

/// Stale when forced, when nothing was ever scraped, or when the last scrape
/// is older than the window.
pub fn cache_state(
    last_scrape: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: chrono::Duration,
    force_refresh: bool,
) -> CacheState {
    match last_scrape {
        _ if force_refresh => CacheState::Stale,
        None => CacheState::Stale,
        Some(last) if now - last > window => CacheState::Stale,
        Some(_) => CacheState::Fresh,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Scrape,
}

#[derive(Debug, Clone)]
pub struct LeagueTable {
    pub rows: Vec<StandingsRow>,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: DataSource,
    pub warnings: Vec<ValidationWarning>,
    /// Set when a refresh failed and the previous snapshot is served instead.
    pub refresh_error: Option<String>,
}

pub struct LeagueTableService {
    store: Arc<dyn Storage>,
    fetcher: Arc<dyn PageFetcher>,
    scraper: LeagueTableScraper,
    validator: Validator,
    cache_timeout: chrono::Duration,
    // Single-flight guard: one scrape-and-write at a time.
    refresh_lock: Mutex<()>,
}

impl LeagueTableService {
    pub fn new(
        config: &ScraperConfig,
        store: Arc<dyn Storage>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        info!(
            "Created league table service (cache window {}s)",
            config.cache_timeout_secs
        );

        Ok(Self {
            store,
            fetcher,
            scraper: LeagueTableScraper::new(config)?,
            validator: Validator::new(config.validation.clone()),
            cache_timeout: config.cache_timeout(),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Serves the stored snapshot while it is fresh, otherwise scrapes,
    /// validates and replaces it.
    pub async fn get_league_table(&self, force_refresh: bool) -> Result<LeagueTable> {
        let last_scrape = self.last_scrape()?;
        if cache_state(last_scrape, Utc::now(), self.cache_timeout, force_refresh)
            == CacheState::Fresh
        {
            info!("Serving cached league table");
            return self.cached(last_scrape, None);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        let last_scrape = self.last_scrape()?;
        if cache_state(last_scrape, Utc::now(), self.cache_timeout, force_refresh)
            == CacheState::Fresh
        {
            info!("League table refreshed by a concurrent request, serving it");
            return self.cached(last_scrape, None);
        }

        info!("League table cache is stale, scraping");
        match self.refresh().await {
            Ok(table) => Ok(table),
            Err(e) => {
                error!("League table refresh failed: {}", e);
                let cached = self.cached(last_scrape, Some(e.to_string()))?;
                if cached.rows.is_empty() {
                    return Err(e);
                }
                warn!("Serving {} cached rows after failed refresh", cached.rows.len());
                Ok(cached)
            }
        }
    }

    fn cached(
        &self,
        last_updated: Option<DateTime<Utc>>,
        refresh_error: Option<String>,
    ) -> Result<LeagueTable> {
        let rows = self.store.load_standings()?;
        // Without a usable scrape timestamp the rows still carry their own.
        let last_updated = last_updated.or_else(|| rows.iter().map(|r| r.captured_at).max());
        Ok(LeagueTable {
            rows,
            last_updated,
            source: DataSource::Cache,
            warnings: Vec::new(),
            refresh_error,
        })
    }

    async fn refresh(&self) -> Result<LeagueTable> {
        let captured_at = Utc::now();
        let html = self.fetcher.fetch().await?;
        let rows = self.scraper.parse(&html, captured_at)?;

        let report = self.validator.validate(&rows);
        if !report.is_valid {
            return Err(LeagueError::Rejected(
                report
                    .rejection
                    .unwrap_or_else(|| "validation failed".to_string()),
            ));
        }

        self.store.replace_standings(&rows)?;
        self.store
            .save_setting(StorageKeys::LAST_SCRAPE, &captured_at.to_rfc3339())?;
        info!(
            "Stored new league table snapshot: {} teams, {} warnings",
            rows.len(),
            report.warnings.len()
        );

        Ok(LeagueTable {
            rows,
            last_updated: Some(captured_at),
            source: DataSource::Scrape,
            warnings: report.warnings,
            refresh_error: None,
        })
    }

    fn last_scrape(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.load_setting(StorageKeys::LAST_SCRAPE)? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Ok(Some(ts.with_timezone(&Utc))),
            Err(e) => {
                warn!("Ignoring unparseable last scrape time '{}': {}", raw, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::services::validation::WarningKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    pub const FIXTURE: &str = include_str!("../../tests/fixtures/highland_league.html");

    pub struct FakeFetcher {
        pub page: std::result::Result<String, FetchError>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn page(html: &str) -> Self {
            Self {
                page: Ok(html.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self {
                page: Err(error),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.page.clone().map_err(LeagueError::from)
        }
    }

    /// In-memory store that counts writes to the snapshot.
    #[derive(Default)]
    pub struct MemoryStore {
        rows: StdMutex<Vec<StandingsRow>>,
        settings: StdMutex<std::collections::HashMap<String, String>>,
        pub writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn with_rows(rows: Vec<StandingsRow>) -> Self {
            let store = Self::default();
            *store.rows.lock().unwrap() = rows;
            store
        }

        pub fn seeded(rows: Vec<StandingsRow>, last_scrape: DateTime<Utc>) -> Self {
            let store = Self::with_rows(rows);
            store
                .settings
                .lock()
                .unwrap()
                .insert(StorageKeys::LAST_SCRAPE.to_string(), last_scrape.to_rfc3339());
            store
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl Storage for MemoryStore {
        fn load_standings(&self) -> Result<Vec<StandingsRow>> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by_key(|r| r.position);
            Ok(rows)
        }

        fn clear_standings(&self) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().clear();
            Ok(())
        }

        fn insert_standings(&self, rows: &[StandingsRow]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }

        fn load_setting(&self, key: &str) -> Result<Option<String>> {
            Ok(self.settings.lock().unwrap().get(key).cloned())
        }

        fn save_setting(&self, key: &str, value: &str) -> Result<()> {
            self.settings
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    pub fn cached_row(position: u32, team: &str) -> StandingsRow {
        StandingsRow {
            position,
            team: team.to_string(),
            played: 2,
            won: 1,
            drawn: 1,
            lost: 0,
            goals_for: 3,
            goals_against: 1,
            goal_difference: 2,
            points: 4,
            form: Vec::new(),
            logo: String::new(),
            captured_at: Utc::now(),
        }
    }

    fn service(store: &Arc<MemoryStore>, fetcher: &Arc<FakeFetcher>) -> LeagueTableService {
        LeagueTableService::new(&ScraperConfig::default(), store.clone(), fetcher.clone()).unwrap()
    }

    fn hours_ago(hours: i64) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::hours(hours)
    }

    #[test]
    fn cache_state_transitions() {
        let now = Utc::now();
        let window = chrono::Duration::hours(6);

        assert_eq!(cache_state(None, now, window, false), CacheState::Stale);
        assert_eq!(
            cache_state(Some(now - chrono::Duration::hours(1)), now, window, false),
            CacheState::Fresh
        );
        assert_eq!(
            cache_state(Some(now - chrono::Duration::hours(1)), now, window, true),
            CacheState::Stale
        );
        assert_eq!(
            cache_state(Some(now - chrono::Duration::hours(7)), now, window, false),
            CacheState::Stale
        );
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_fetching() {
        let store = Arc::new(MemoryStore::seeded(
            vec![cached_row(2, "Huntly"), cached_row(1, "Keith")],
            hours_ago(1),
        ));
        let fetcher = Arc::new(FakeFetcher::page(FIXTURE));
        let service = service(&store, &fetcher);

        let first = service.get_league_table(false).await.unwrap();
        let second = service.get_league_table(false).await.unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.rows[0].team, "Keith");
        assert_eq!(first.source, DataSource::Cache);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn stale_cache_triggers_scrape() {
        let store = Arc::new(MemoryStore::seeded(vec![cached_row(1, "Keith")], hours_ago(7)));
        let fetcher = Arc::new(FakeFetcher::page(FIXTURE));
        let service = service(&store, &fetcher);

        let table = service.get_league_table(false).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(table.source, DataSource::Scrape);
        assert_eq!(table.rows.len(), 18);
        assert_eq!(store.load_standings().unwrap().len(), 18);

        // Timestamp was moved forward, so the next call is a cache hit.
        service.get_league_table(false).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_fresh_cache() {
        let store = Arc::new(MemoryStore::seeded(vec![cached_row(1, "Keith")], hours_ago(1)));
        let fetcher = Arc::new(FakeFetcher::page(FIXTURE));
        let service = service(&store, &fetcher);

        let table = service.get_league_table(true).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(table.source, DataSource::Scrape);
    }

    #[tokio::test]
    async fn scraped_fixture_is_sorted_with_played_warning() {
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::page(FIXTURE));
        let service = service(&store, &fetcher);

        let table = service.get_league_table(false).await.unwrap();

        assert_eq!(table.rows.len(), 18);
        assert!(table.rows.windows(2).all(|w| w[0].position < w[1].position));

        let wick = table.rows.iter().find(|r| r.team == "Wick Academy").unwrap();
        assert_eq!(wick.played, 0);
        assert!(table
            .warnings
            .iter()
            .any(|w| w.position == wick.position && w.kind == WarningKind::PlayedMismatch));
    }

    #[tokio::test]
    async fn fetch_timeout_preserves_cache() {
        let previous = vec![cached_row(1, "Keith"), cached_row(2, "Huntly")];
        let store = Arc::new(MemoryStore::seeded(previous.clone(), hours_ago(7)));
        let fetcher = Arc::new(FakeFetcher::failing(FetchError::Timeout(10_000)));
        let service = service(&store, &fetcher);

        let table = service.get_league_table(false).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.writes(), 0);
        assert_eq!(table.rows, previous);
        assert_eq!(table.source, DataSource::Cache);
        assert!(table.refresh_error.unwrap().contains("timed out"));
        assert_eq!(store.load_standings().unwrap(), previous);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::failing(FetchError::HttpStatus(503)));
        let service = service(&store, &fetcher);

        let err = service.get_league_table(false).await.unwrap_err();
        assert!(matches!(err, LeagueError::Fetch(FetchError::HttpStatus(503))));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn rejected_scrape_keeps_previous_snapshot() {
        let previous = vec![cached_row(1, "Keith")];
        let store = Arc::new(MemoryStore::seeded(previous.clone(), hours_ago(8)));
        let header_only = format!(
            "<table><tr><th>Pos</th><th>Team</th></tr></table>{}",
            " ".repeat(1200)
        );
        let fetcher = Arc::new(FakeFetcher::page(&header_only));
        let service = service(&store, &fetcher);

        let table = service.get_league_table(false).await.unwrap();
        assert_eq!(table.rows, previous);
        assert!(table.refresh_error.is_some());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn degraded_table_without_timestamp_uses_row_capture_time() {
        let mut keith = cached_row(1, "Keith");
        keith.captured_at = hours_ago(30);
        let mut huntly = cached_row(2, "Huntly");
        huntly.captured_at = hours_ago(20);
        let newest = huntly.captured_at;

        for stored in [None, Some("not a timestamp")] {
            let store = Arc::new(MemoryStore::with_rows(vec![keith.clone(), huntly.clone()]));
            if let Some(raw) = stored {
                store.save_setting(StorageKeys::LAST_SCRAPE, raw).unwrap();
            }
            let fetcher = Arc::new(FakeFetcher::failing(FetchError::HttpStatus(502)));

            let table = service(&store, &fetcher).get_league_table(false).await.unwrap();

            assert_eq!(table.source, DataSource::Cache);
            assert!(table.refresh_error.is_some());
            assert_eq!(table.last_updated, Some(newest));
        }
    }

    #[tokio::test]
    async fn concurrent_stale_callers_scrape_once() {
        let store = Arc::new(MemoryStore::default());
        let mut fetcher = FakeFetcher::page(FIXTURE);
        fetcher.delay = Duration::from_millis(50);
        let fetcher = Arc::new(fetcher);
        let service = service(&store, &fetcher);

        let (a, b) = tokio::join!(
            service.get_league_table(false),
            service.get_league_table(false)
        );

        assert_eq!(a.unwrap().rows.len(), 18);
        assert_eq!(b.unwrap().rows.len(), 18);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn unparseable_timestamp_counts_as_stale() {
        let store = Arc::new(MemoryStore::default());
        store
            .save_setting(StorageKeys::LAST_SCRAPE, "yesterday-ish")
            .unwrap();
        let fetcher = Arc::new(FakeFetcher::page(FIXTURE));
        let service = service(&store, &fetcher);

        service.get_league_table(false).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }
}
