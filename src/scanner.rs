//! Scan orchestrator.
//!
//! Drives the unbounded scan loop as an explicit phase machine:
//! fetch the listing → analyse each token with a visible countdown →
//! cool down so cycles are never tighter than one minute → repeat.
//! `Terminated` is entered only on ctrl-c; everything else recovers by
//! logging and starting a fresh cycle after a short delay.

use reqwest::Url;
use std::io::Write as _;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::Instant;
use tracing::{error, info};

use crate::aggregate::aggregate;
use crate::coingecko::{CoinGeckoClient, MarketEntry};
use crate::config::ScannerConfig;
use crate::error::{ApiResult, ScanError};
use crate::estimator::estimate;
use crate::report;
use crate::types::{ArbOutcome, TokenId};

/// Cycles are padded out to at least this much wall time.
const CYCLE_FLOOR: Duration = Duration::from_secs(60);

/// Delay before retrying after an unhandled per-cycle error.
const ERROR_RETRY_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Phase machine
// ---------------------------------------------------------------------------

/// The orchestrator's explicit states. The token list travels with the
/// phase so a cycle holds no state outside it.
#[derive(Debug)]
enum Phase {
    FetchingListing,
    AnalyzingToken {
        tokens: Vec<TokenId>,
        idx: usize,
        cycle_start: Instant,
    },
    CoolingDown {
        cycle_start: Instant,
    },
    Terminated,
}

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Make sure the listing URL carries the mandatory `vs_currency`
/// denomination, injecting `usd` when absent. All other query pairs are
/// preserved verbatim.
pub fn ensure_vs_currency(raw: &str) -> Result<String, ScanError> {
    let mut url =
        Url::parse(raw).map_err(|e| ScanError::InvalidUrl(format!("{raw}: {e}")))?;

    let present = url.query_pairs().any(|(k, _)| k == "vs_currency");
    if !present {
        println!("⚠️  URL missing required 'vs_currency' param, adding vs_currency=usd");
        url.query_pairs_mut().append_pair("vs_currency", "usd");
    }
    Ok(url.to_string())
}

/// Rank the listing by market cap (missing treated as 0) and keep the
/// top `n` tokens.
pub fn rank_tokens(mut markets: Vec<MarketEntry>, n: usize) -> Vec<TokenId> {
    markets.sort_by(|a, b| {
        let ca = a.market_cap.unwrap_or(0.0);
        let cb = b.market_cap.unwrap_or(0.0);
        cb.partial_cmp(&ca).unwrap_or(std::cmp::Ordering::Equal)
    });
    markets
        .into_iter()
        .take(n)
        .map(|m| TokenId {
            name: m.name,
            id: m.id,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct Scanner {
    client: CoinGeckoClient,
    cfg: ScannerConfig,
    input: Lines<BufReader<Stdin>>,
}

impl Scanner {
    pub fn new(client: CoinGeckoClient, cfg: ScannerConfig) -> Self {
        Self {
            client,
            cfg,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Run the scan loop until ctrl-c (Ok) or a fatal input error (Err).
    pub async fn run(&mut self) -> Result<(), ScanError> {
        let mut phase = Phase::FetchingListing;
        loop {
            let next = tokio::select! {
                next = self.step(phase) => next?,
                _ = tokio::signal::ctrl_c() => Phase::Terminated,
            };
            match next {
                Phase::Terminated => {
                    println!("\n👋  Stopping scanner. Bye!");
                    info!("Scanner stopped by operator");
                    return Ok(());
                }
                p => phase = p,
            }
        }
    }

    async fn step(&mut self, phase: Phase) -> Result<Phase, ScanError> {
        match phase {
            Phase::FetchingListing => self.fetch_listing().await,
            Phase::AnalyzingToken {
                tokens,
                idx,
                cycle_start,
            } => self.analyze_token(tokens, idx, cycle_start).await,
            Phase::CoolingDown { cycle_start } => Ok(self.cool_down(cycle_start).await),
            Phase::Terminated => Ok(Phase::Terminated),
        }
    }

    // -- FetchingListing -------------------------------------------------

    async fn fetch_listing(&mut self) -> Result<Phase, ScanError> {
        self.client.reset_budget().await;
        let cycle_start = Instant::now();

        println!("Paste full /coins/markets API endpoint URL (including all query params):");
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = match self.input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!(
                    "Could not read input from user. If running in a restricted \
                     environment, pass the URL via a config endpoint instead."
                );
                return Err(ScanError::Stdin(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stdin closed",
                )));
            }
            Err(e) => {
                println!("Could not read input from user.");
                return Err(ScanError::Stdin(e));
            }
        };

        let url = line.trim();
        if !url.starts_with("http") {
            println!("Invalid URL. Exiting.");
            return Err(ScanError::InvalidUrl(url.to_string()));
        }
        let url = ensure_vs_currency(url)?;

        let markets = match self.client.fetch_markets(&url).await {
            Ok(m) => m,
            Err(e) => {
                println!("❌ API error: {e}\nCheck your URL and parameters.");
                error!(error = %e, "Listing fetch failed");
                return Ok(Phase::CoolingDown { cycle_start });
            }
        };

        let tokens = rank_tokens(markets, self.cfg.top_tokens);
        println!("Analysing {} tokens …", tokens.len());
        info!(tokens = tokens.len(), "Scan cycle started");

        Ok(Phase::AnalyzingToken {
            tokens,
            idx: 0,
            cycle_start,
        })
    }

    // -- AnalyzingToken --------------------------------------------------

    async fn analyze_token(
        &mut self,
        tokens: Vec<TokenId>,
        idx: usize,
        cycle_start: Instant,
    ) -> Result<Phase, ScanError> {
        let Some(token) = tokens.get(idx) else {
            return Ok(Phase::CoolingDown { cycle_start });
        };

        if let Err(e) = self.analyse(token).await {
            println!("\n‼️  Unhandled error; retrying in 5 s\n");
            error!(error = %e, token = %token.id, "Token analysis failed, restarting cycle");
            tokio::time::sleep(ERROR_RETRY_DELAY).await;
            return Ok(Phase::FetchingListing);
        }

        wait_with_countdown(self.cfg.token_pause_secs).await;

        Ok(Phase::AnalyzingToken {
            tokens,
            idx: idx + 1,
            cycle_start,
        })
    }

    /// Fetch, aggregate, estimate, and print one token.
    async fn analyse(&self, token: &TokenId) -> ApiResult<()> {
        println!("\n── {} ({}) ──", token.name, token.id);

        let ticks = self.client.fetch_tickers(&token.id).await?;
        let table = aggregate(&ticks, &self.cfg.dex_keywords);
        if table.is_empty() {
            println!("No DEX markets found.");
            return Ok(());
        }

        println!("{}", report::render_table(&table));

        match estimate(&table, &self.cfg) {
            ArbOutcome::SingleVenue => {
                println!("\nOnly one DEX venue – no intra-DEX arbitrage.");
            }
            ArbOutcome::TooSmall { .. } => {
                println!("\nTrade size would be < $1 — skipping.");
            }
            ArbOutcome::Plan(plan) => {
                println!("{}", report::render_plan(&plan));
            }
        }
        Ok(())
    }

    // -- CoolingDown -----------------------------------------------------

    async fn cool_down(&self, cycle_start: Instant) -> Phase {
        let elapsed = cycle_start.elapsed();
        if elapsed < CYCLE_FLOOR {
            let spare = CYCLE_FLOOR - elapsed;
            println!(
                "\n--- cycle done; sleeping {:.1}s (rate-limit) ---\n",
                spare.as_secs_f64()
            );
            tokio::time::sleep(spare).await;
        } else {
            println!("\n--- cycle done; immediately restarting ---\n");
        }
        Phase::FetchingListing
    }
}

/// Visible per-second countdown between tokens.
async fn wait_with_countdown(seconds: u64) {
    for t in (1..=seconds).rev() {
        print!("\r⏳  next token in {t:2}s ");
        let _ = std::io::stdout().flush();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    print!("\r");
    let _ = std::io::stdout().flush();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
