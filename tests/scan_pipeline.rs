//! End-to-end pipeline tests against a scripted HTTP transport.
//!
//! Exercises the real client → aggregate → estimate path with canned
//! CoinGecko JSON, without touching the network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use dexscan::aggregate::aggregate;
use dexscan::coingecko::{CoinGeckoClient, HttpTransport, RawResponse};
use dexscan::config::{ApiConfig, ScannerConfig};
use dexscan::error::{ApiError, ApiResult};
use dexscan::estimator::estimate;
use dexscan::scanner::rank_tokens;
use dexscan::types::ArbOutcome;

/// Replays queued responses for URL substrings and records every request.
struct ScriptedTransport {
    routes: Mutex<Vec<(String, VecDeque<RawResponse>)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn enqueue(&self, url_fragment: &str, response: RawResponse) {
        let mut routes = self.routes.lock().unwrap();
        if let Some((_, queue)) = routes.iter_mut().find(|(f, _)| f == url_fragment) {
            queue.push_back(response);
        } else {
            routes.push((url_fragment.to_string(), VecDeque::from([response])));
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> ApiResult<RawResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut routes = self.routes.lock().unwrap();
        let (_, queue) = routes
            .iter_mut()
            .find(|(f, _)| url.contains(f.as_str()))
            .unwrap_or_else(|| panic!("unscripted request: {url}"));
        Ok(queue.pop_front().unwrap_or_else(|| panic!("queue empty for {url}")))
    }
}

fn ok(body: serde_json::Value) -> RawResponse {
    RawResponse {
        status: 200,
        retry_after: None,
        body: body.to_string(),
    }
}

fn throttled(retry_after: Option<u64>) -> RawResponse {
    RawResponse {
        status: 429,
        retry_after,
        body: "Throttled".to_string(),
    }
}

fn listing_json() -> serde_json::Value {
    serde_json::json!([
        { "id": "bonk", "name": "Bonk", "market_cap": 1.5e9 },
        { "id": "solana", "name": "Solana", "market_cap": 6.0e10 },
        { "id": "mystery", "name": "Mystery" }
    ])
}

fn solana_tickers_json() -> serde_json::Value {
    serde_json::json!({
        "tickers": [
            {
                "base": "SOL", "target": "USDC",
                "market": { "name": "Raydium" },
                "converted_last": { "usd": 100.0 },
                "converted_volume": { "usd": 100000.0 }
            },
            {
                "base": "SOL", "target": "USDC",
                "market": { "name": "Orca" },
                "converted_last": { "usd": 102.0 },
                "converted_volume": { "usd": 50000.0 }
            },
            {
                "base": "SOL", "target": "USDT",
                "market": { "name": "Binance" },
                "converted_last": { "usd": 101.0 },
                "converted_volume": { "usd": 9000000.0 }
            },
            {
                "base": "SOL", "target": "EUR",
                "market": { "name": "DeadSwap" },
                "converted_last": { "usd": 0.0 },
                "converted_volume": { "usd": 12345.0 }
            }
        ]
    })
}

fn client_with(transport: Box<dyn HttpTransport>) -> CoinGeckoClient {
    CoinGeckoClient::new(transport, &ApiConfig::default())
}

#[tokio::test]
async fn full_pipeline_produces_a_plan_for_the_top_token() {
    let transport = ScriptedTransport::new();
    transport.enqueue("/coins/markets", ok(listing_json()));
    transport.enqueue("/coins/solana/tickers", ok(solana_tickers_json()));
    let client = client_with(Box::new(transport));

    let markets = client
        .fetch_markets("https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd")
        .await
        .unwrap();
    let tokens = rank_tokens(markets, 1);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].id, "solana");
    assert_eq!(tokens[0].name, "Solana");

    let cfg = ScannerConfig::default();
    let ticks = client.fetch_tickers(&tokens[0].id).await.unwrap();
    assert_eq!(ticks.len(), 4);

    // Binance is filtered (not a DEX); DeadSwap is dropped (zero price).
    let table = aggregate(&ticks, &cfg.dex_keywords);
    let venues: Vec<&str> = table.iter().map(|r| r.venue.as_str()).collect();
    assert_eq!(venues, vec!["Raydium", "Orca"]);

    let plan = match estimate(&table, &cfg) {
        ArbOutcome::Plan(p) => p,
        other => panic!("expected a plan, got {other:?}"),
    };
    assert_eq!(plan.buy_venue, "Raydium");
    assert_eq!(plan.sell_venue, "Orca");
    assert!((plan.spread_pct - 2.0).abs() < 1e-9);
    assert!((plan.trade_cap - 100.0).abs() < 1e-9);
    assert!(plan.net_profit > 0.0);
}

#[tokio::test]
async fn single_dex_venue_yields_no_opportunity() {
    let transport = ScriptedTransport::new();
    transport.enqueue(
        "/coins/bonk/tickers",
        ok(serde_json::json!({
            "tickers": [
                {
                    "base": "BONK", "target": "SOL",
                    "market": { "name": "Raydium" },
                    "converted_last": { "usd": 0.00002 },
                    "converted_volume": { "usd": 80000.0 }
                },
                {
                    "base": "BONK", "target": "USDT",
                    "market": { "name": "Gate.io" },
                    "converted_last": { "usd": 0.00002 },
                    "converted_volume": { "usd": 400000.0 }
                }
            ]
        })),
    );
    let client = client_with(Box::new(transport));
    let cfg = ScannerConfig::default();

    let ticks = client.fetch_tickers("bonk").await.unwrap();
    let table = aggregate(&ticks, &cfg.dex_keywords);
    assert_eq!(table.len(), 1);
    assert!(matches!(estimate(&table, &cfg), ArbOutcome::SingleVenue));
}

#[tokio::test(start_paused = true)]
async fn tickers_fetch_recovers_from_a_429() {
    let transport = ScriptedTransport::new();
    transport.enqueue("/coins/solana/tickers", throttled(Some(20)));
    transport.enqueue("/coins/solana/tickers", ok(solana_tickers_json()));

    let counted = std::sync::Arc::new(transport);
    let client = CoinGeckoClient::new(Box::new(ArcTransport(counted.clone())), &ApiConfig::default());

    let ticks = client.fetch_tickers("solana").await.unwrap();
    assert_eq!(ticks.len(), 4);
    assert_eq!(counted.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn retry_budget_exhaustion_surfaces_the_429() {
    let transport = ScriptedTransport::new();
    for _ in 0..4 {
        transport.enqueue("/coins/solana/tickers", throttled(None));
    }
    let counted = std::sync::Arc::new(transport);
    let client = CoinGeckoClient::new(Box::new(ArcTransport(counted.clone())), &ApiConfig::default());

    let err = client.fetch_tickers("solana").await.unwrap_err();
    match err {
        ApiError::Status { status, .. } => assert_eq!(status, 429),
        other => panic!("expected a status error, got {other:?}"),
    }
    // 1 initial attempt + 3 retries (the default budget).
    assert_eq!(counted.request_count(), 4);
}

/// Adapter so a shared `ScriptedTransport` can be handed to the client
/// while the test keeps a handle for assertions.
struct ArcTransport(std::sync::Arc<ScriptedTransport>);

#[async_trait]
impl HttpTransport for ArcTransport {
    async fn get(&self, url: &str) -> ApiResult<RawResponse> {
        self.0.get(url).await
    }
}
