//! Configuration loading from TOML with built-in defaults.
//!
//! Every field carries a serde default mirroring the scanner's original
//! tuning, so the binary runs with no `config.toml` present. When the file
//! exists it overrides whichever knobs it names. The optional CoinGecko
//! demo API key is referenced by env-var name and resolved at runtime.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub api: ApiConfig,
}

/// Scan pacing and trade-sizing knobs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    /// Tokens analysed per scan cycle (top-N by market cap).
    pub top_tokens: usize,
    /// Visible countdown after each token, in seconds.
    pub token_pause_secs: u64,
    /// Capital ceiling per synthetic trade, USD.
    pub max_capital_usd: f64,
    /// Trade at most this fraction of each leg's 24h volume.
    pub volume_fraction: f64,
    /// Taker fee per leg.
    pub fee_rate: f64,
    /// Slippage scaler: 1% slippage for 10% of 24h volume.
    pub slippage_scaler: f64,
    /// Lowercase substrings that mark a venue as a DEX.
    pub dex_keywords: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            top_tokens: 100,
            token_pause_secs: 35,
            max_capital_usd: 1_000.0,
            volume_fraction: 0.002,
            fee_rate: 0.003,
            slippage_scaler: 0.10,
            dex_keywords: [
                "dex",
                "swap",
                "router",
                "raydium",
                "orca",
                "meteora",
                "lifinity",
                "phoenix",
                "cykura",
                "jupiter",
                "pancakeswap",
                "birdeye",
                "thruster",
                "goosefx",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// HTTP budget and retry knobs for the CoinGecko client.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Outbound calls allowed per minute bucket.
    pub max_calls_per_minute: u32,
    /// Retry budget for HTTP 429 responses.
    pub max_retries_429: u32,
    /// Per-request timeout, seconds.
    pub http_timeout_secs: u64,
    /// Env var holding an optional CoinGecko demo API key.
    pub api_key_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_calls_per_minute: 40,
            max_retries_429: 3,
            http_timeout_secs: 10,
            api_key_env: "COINGECKO_API_KEY".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to the built-in
    /// defaults when the file does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve the configured API-key env var, if set in the environment.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_script_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.scanner.top_tokens, 100);
        assert_eq!(cfg.scanner.token_pause_secs, 35);
        assert_eq!(cfg.scanner.max_capital_usd, 1_000.0);
        assert_eq!(cfg.scanner.volume_fraction, 0.002);
        assert_eq!(cfg.scanner.fee_rate, 0.003);
        assert_eq!(cfg.scanner.slippage_scaler, 0.10);
        assert_eq!(cfg.api.max_calls_per_minute, 40);
        assert_eq!(cfg.api.max_retries_429, 3);
        assert_eq!(cfg.api.http_timeout_secs, 10);
        assert!(cfg.scanner.dex_keywords.iter().any(|w| w == "raydium"));
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [scanner]
            top_tokens = 5

            [api]
            max_calls_per_minute = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scanner.top_tokens, 5);
        assert_eq!(cfg.api.max_calls_per_minute, 10);
        // Unnamed fields keep their defaults.
        assert_eq!(cfg.scanner.fee_rate, 0.003);
        assert_eq!(cfg.api.max_retries_429, 3);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default("definitely-not-here.toml").unwrap();
        assert_eq!(cfg.scanner.top_tokens, 100);
    }
}
