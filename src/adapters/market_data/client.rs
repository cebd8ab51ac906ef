//! Gamma API Client - Rate-limited REST client for the Market Data Source.
//!
//! Mirrors the request shape of `ClobClient` (rate limiting, bounded
//! retries with exponential backoff) but adds offset-based pagination,
//! since the Gamma `/markets` endpoint pages its results.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::PolymarketConfig;
use crate::domain::MarketSnapshot;
use crate::error::ApiError;
use crate::ports::market_data::MarketDataSource;

use super::parse::parse_gamma_market;

const PAGE_SIZE: usize = 500;
const MAX_RETRIES: u32 = 3;

/// HTTP client for the Polymarket Gamma API.
pub struct GammaClient {
    http: Client,
    config: PolymarketConfig,
    last_request_at: Mutex<Option<Instant>>,
}

impl GammaClient {
    pub fn new(config: PolymarketConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            http,
            config,
            last_request_at: Mutex::new(None),
        })
    }

    /// Sleep, if needed, to respect `rate_limit_delay_ms` between requests.
    async fn rate_limit(&self) {
        let delay = self.config.rate_limit_delay();
        let mut last = self.last_request_at.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                sleep(delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET `path` with up to `MAX_RETRIES` attempts: 5xx and transport
    /// errors retry with exponential backoff, 4xx fails immediately.
    async fn get_with_retries(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            self.rate_limit().await;

            let result = self.http.get(&url).query(query).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| ApiError::Terminal(format!("invalid JSON body: {e}")));
                    }
                    if status.is_server_error() {
                        last_error = Some(ApiError::Transient(format!(
                            "Gamma API {url} failed with {status}"
                        )));
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(ApiError::Terminal(format!(
                            "Gamma API {url} failed with {status}: {body}"
                        )));
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_error = Some(ApiError::Transient(e.to_string()));
                }
                Err(e) => return Err(ApiError::Terminal(e.to_string())),
            }

            if attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(500) * 2u32.pow(attempt - 1);
                warn!(attempt, ?backoff, %url, "retrying Gamma API request");
                sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Transient("max retries exceeded".into())))
    }

    fn parse_page(&self, body: Value) -> Result<Vec<Value>, ApiError> {
        match body {
            Value::Array(items) => Ok(items),
            other => Err(ApiError::Terminal(format!(
                "expected array response from Gamma API, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl MarketDataSource for GammaClient {
    async fn fetch_all_active(&self) -> Result<HashMap<String, MarketSnapshot>, ApiError> {
        let mut result = HashMap::new();
        let mut offset = 0usize;

        while offset < self.config.pagination_cap as usize {
            let body = self
                .get_with_retries(
                    "markets",
                    &[
                        ("limit", PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let page = self.parse_page(body)?;
            let page_len = page.len();

            for item in page {
                match parse_gamma_market(&item) {
                    Some(snapshot) => {
                        result.insert(snapshot.market_id.clone(), snapshot);
                    }
                    None => debug!("skipped unparseable market record"),
                }
            }

            if page_len < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(result)
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<MarketSnapshot>, ApiError> {
        let body = self
            .get_with_retries("markets", &[("slug", slug.to_string())])
            .await?;
        let page = self.parse_page(body)?;
        Ok(page.first().and_then(parse_gamma_market))
    }
}
