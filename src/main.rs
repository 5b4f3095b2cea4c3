//! DEXSCAN — intra-DEX arbitrage scanner.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the rate-limited CoinGecko client into the scan orchestrator,
//! and runs the prompt→fetch→analyse loop until interrupted.

use anyhow::Result;
use tracing::{error, info};

use dexscan::coingecko::{CoinGeckoClient, ReqwestTransport};
use dexscan::config::AppConfig;
use dexscan::scanner::Scanner;

const BANNER: &str = r#"
 ____  _______  ______   ____    _    _   _
|  _ \| ____\ \/ / ___| / ___|  / \  | \ | |
| | | |  _|  \  / \___ \| |    / _ \ |  \| |
| |_| | |___ /  \  ___) | |___/ ___ \| |\  |
|____/|_____/_/\_\|____/ \____/_/   \_\_| \_|

  Intra-DEX Arbitrage Scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        top_tokens = cfg.scanner.top_tokens,
        calls_per_minute = cfg.api.max_calls_per_minute,
        token_pause_secs = cfg.scanner.token_pause_secs,
        "DEXSCAN starting up"
    );

    let api_key = cfg.api_key();
    if api_key.is_some() {
        info!("Using CoinGecko demo API key from environment");
    }

    let transport = ReqwestTransport::new(cfg.api.http_timeout_secs, api_key)?;
    let client = CoinGeckoClient::new(Box::new(transport), &cfg.api);
    let mut scanner = Scanner::new(client, cfg.scanner);

    match scanner.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Fatal input error");
            std::process::exit(1);
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dexscan=info"));

    let json_logging = std::env::var("DEXSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
