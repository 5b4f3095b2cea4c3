//! CoinGecko API client with minute-bucket rate limiting and 429 back-off.
//!
//! API docs: https://www.coingecko.com/en/api/documentation
//! Base URL: https://api.coingecko.com/api/v3
//! Rate limit: the public tier tolerates roughly 50 calls/minute, so the
//! client budgets below that and honours `Retry-After` on 429s.
//! Auth: not required; an optional demo key is sent as `x-cg-demo-api-key`.
//!
//! The HTTP layer sits behind the `HttpTransport` trait so the retry and
//! budget logic can be exercised without a network.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::TickerRecord;

#[cfg(test)]
use mockall::automock;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Length of one rate-limit bucket.
const WINDOW: Duration = Duration::from_secs(60);

/// Back-off applied when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Bounds for server-provided back-off values.
const MIN_RETRY_AFTER: Duration = Duration::from_secs(5);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// API response types (CoinGecko JSON → Rust)
// ---------------------------------------------------------------------------

/// One entry of the `/coins/markets` listing. Only the fields the scanner
/// uses are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketEntry {
    pub id: String,
    pub name: String,
    /// Absent for some freshly listed tokens; treated as 0 when ranking.
    #[serde(default)]
    pub market_cap: Option<f64>,
}

/// Envelope of `/coins/{id}/tickers`.
#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(default)]
    tickers: Vec<RawTicker>,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    base: String,
    target: String,
    market: RawMarket,
    #[serde(default)]
    converted_last: Option<ConvertedQuote>,
    #[serde(default)]
    converted_volume: Option<ConvertedQuote>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ConvertedQuote {
    #[serde(default)]
    usd: Option<f64>,
}

impl RawTicker {
    fn into_record(self) -> TickerRecord {
        TickerRecord {
            venue: self.market.name,
            base: self.base,
            target: self.target,
            price_usd: self.converted_last.and_then(|q| q.usd),
            volume_usd: self.converted_volume.and_then(|q| q.usd).unwrap_or(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// A raw HTTP response, reduced to what the retry logic needs.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed `Retry-After` header in seconds, when present.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking-free HTTP GET, implemented by `ReqwestTransport` in production
/// and by mocks/scripted fakes in tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> ApiResult<RawResponse>;
}

/// Production transport over a shared `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the client with a fixed request timeout and an optional demo
    /// API key attached to every request.
    pub fn new(timeout_secs: u64, api_key: Option<String>) -> ApiResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = api_key {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&key) {
                headers.insert("x-cg-demo-api-key", value);
            } else {
                warn!("API key contains invalid header characters, ignoring");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("dexscan/0.1.0 (intra-dex-arbitrage-scanner)")
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport {
                label: "client".into(),
                message: e.to_string(),
            })?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> ApiResult<RawResponse> {
        let resp = self.http.get(url).send().await.map_err(|e| ApiError::Transport {
            label: url.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = resp.text().await.unwrap_or_default();

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Minute-bucket call budget.
///
/// Counts every attempt regardless of outcome. When the bucket is full,
/// `admit` blocks until 60s have passed since the window opened, then
/// rolls the window. Reset explicitly at the start of every scan cycle.
#[derive(Debug)]
pub struct RateBucket {
    cap: u32,
    calls: u32,
    window_start: Instant,
}

impl RateBucket {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            calls: 0,
            window_start: Instant::now(),
        }
    }

    /// Start a fresh window with a zeroed counter.
    pub fn reset(&mut self) {
        self.calls = 0;
        self.window_start = Instant::now();
    }

    /// Reserve one call, sleeping out the rest of the window first when
    /// the budget is exhausted.
    pub async fn admit(&mut self) {
        if self.calls >= self.cap {
            let elapsed = self.window_start.elapsed();
            if elapsed < WINDOW {
                let wait = WINDOW - elapsed;
                debug!(wait_secs = wait.as_secs_f64(), "Call budget exhausted, waiting for window");
                tokio::time::sleep(wait).await;
            }
            self.reset();
        }
        self.calls += 1;
    }

    #[cfg(test)]
    fn calls(&self) -> u32 {
        self.calls
    }
}

/// Clamp a server-provided `Retry-After` (seconds) into [5s, 60s],
/// defaulting to 10s when the header was absent or unparseable.
fn clamp_retry_after(header: Option<u64>) -> Duration {
    let wait = header.map(Duration::from_secs).unwrap_or(DEFAULT_RETRY_AFTER);
    wait.clamp(MIN_RETRY_AFTER, MAX_RETRY_AFTER)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Rate-limited CoinGecko client.
pub struct CoinGeckoClient {
    transport: Box<dyn HttpTransport>,
    limiter: Mutex<RateBucket>,
    max_retries_429: u32,
}

impl CoinGeckoClient {
    pub fn new(transport: Box<dyn HttpTransport>, cfg: &ApiConfig) -> Self {
        Self {
            transport,
            limiter: Mutex::new(RateBucket::new(cfg.max_calls_per_minute)),
            max_retries_429: cfg.max_retries_429,
        }
    }

    /// Reset the call budget. Invoked by the orchestrator at cycle start.
    pub async fn reset_budget(&self) {
        self.limiter.lock().await.reset();
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// Every attempt (including retries) passes through the rate bucket.
    /// 429s are retried up to `max_retries_429` times with a clamped,
    /// header-informed back-off; the final 429 is surfaced to the caller.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, label: &str) -> ApiResult<T> {
        let mut retries_left = self.max_retries_429;

        loop {
            self.limiter.lock().await.admit().await;

            let resp = self.transport.get(url).await?;

            if resp.status == 429 {
                if retries_left == 0 {
                    println!("⚠️  skip {label} after too many 429s");
                    return Err(ApiError::Status {
                        label: label.to_string(),
                        status: 429,
                        body: resp.body,
                    });
                }
                let wait = clamp_retry_after(resp.retry_after);
                println!("429 on {label} – sleeping {}s", wait.as_secs());
                warn!(label, wait_secs = wait.as_secs(), "Rate limited, backing off");
                tokio::time::sleep(wait).await;
                retries_left -= 1;
                continue;
            }

            if !resp.is_success() {
                return Err(ApiError::Status {
                    label: label.to_string(),
                    status: resp.status,
                    body: resp.body,
                });
            }

            return serde_json::from_str(&resp.body).map_err(|e| ApiError::Decode {
                label: label.to_string(),
                message: e.to_string(),
            });
        }
    }

    /// Fetch the token listing from a caller-supplied `/coins/markets` URL.
    pub async fn fetch_markets(&self, url: &str) -> ApiResult<Vec<MarketEntry>> {
        self.get_json(url, "market-caps").await
    }

    /// Fetch per-venue tickers for one token.
    pub async fn fetch_tickers(&self, coin_id: &str) -> ApiResult<Vec<TickerRecord>> {
        let url = format!("{BASE_URL}/coins/{coin_id}/tickers");
        let resp: TickersResponse = self.get_json(&url, coin_id).await?;
        Ok(resp.tickers.into_iter().map(RawTicker::into_record).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
