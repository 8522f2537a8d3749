use crate::config::ScraperConfig;
use crate::error::{FetchError, LeagueError, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Source of raw league-page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Single-attempt GET against the league page with browser-like headers.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: Client,
    url: String,
    timeout: Duration,
    min_body_len: usize,
}

impl HtmlFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| LeagueError::Other(format!("invalid Accept-Language: {e}")))?,
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(LeagueError::Network)?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout: config.timeout(),
            min_body_len: config.min_body_len,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_body(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()).into());
        }

        Ok(response.text().await?)
    }

    fn timeout_error(&self) -> LeagueError {
        FetchError::Timeout(self.timeout.as_millis() as u64).into()
    }
}

#[async_trait]
impl PageFetcher for HtmlFetcher {
    async fn fetch(&self) -> Result<String> {
        info!("Fetching league page {}", self.url);
        let start = Instant::now();

        // Dropping the request future on expiry aborts the in-flight request.
        let body = match tokio::time::timeout(self.timeout, self.get_body()).await {
            Ok(Ok(body)) => body,
            Ok(Err(LeagueError::Network(e))) if e.is_timeout() => {
                return Err(self.timeout_error())
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(self.timeout_error()),
        };

        if body.len() < self.min_body_len {
            warn!(
                "League page body only {} bytes, expected at least {}",
                body.len(),
                self.min_body_len
            );
            return Err(FetchError::SuspiciouslyShort(body.len()).into());
        }

        debug!(
            "Fetched {} bytes in {:?}",
            body.len(),
            start.elapsed()
        );
        Ok(body)
    }
}
