//! Shared types for the scanner.
//!
//! These form the data model used across the fetch, aggregate, and
//! estimate stages. Nothing here persists across process restarts; every
//! value is rebuilt each cycle from a fresh API snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Ticker records
// ---------------------------------------------------------------------------

/// One exchange/pair quote, sourced verbatim from the tickers endpoint.
///
/// `price_usd` stays optional here; the aggregator is the single place
/// that decides a zero or missing price makes the record unusable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Venue (exchange/market) name as reported by the API.
    pub venue: String,
    pub base: String,
    pub target: String,
    /// Last price converted to USD.
    pub price_usd: Option<f64>,
    /// 24h volume converted to USD.
    pub volume_usd: f64,
}

impl TickerRecord {
    /// The `BASE/TARGET` pair string used in reports.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.target)
    }
}

/// One row of the venue-aggregate table: a venue's mean price and summed
/// volume across all of its pairs for the current token.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueRow {
    pub venue: String,
    /// First pair string seen for this venue.
    pub pair: String,
    /// Mean USD price across the venue's records.
    pub price: f64,
    /// Summed 24h USD volume across the venue's records.
    pub volume: f64,
}

impl fmt::Display for VenueRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ ${:.6} (vol ${:.0})",
            self.venue, self.pair, self.price, self.volume
        )
    }
}

// ---------------------------------------------------------------------------
// Token listing
// ---------------------------------------------------------------------------

/// A token selected from the market-cap listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenId {
    /// Display name, e.g. "Solana".
    pub name: String,
    /// API identifier, e.g. "solana".
    pub id: String,
}

// ---------------------------------------------------------------------------
// Arbitrage outcome
// ---------------------------------------------------------------------------

/// A fully computed synthetic arbitrage plan for one token.
///
/// Ephemeral: computed fresh per token per cycle, printed, and dropped.
#[derive(Debug, Clone)]
pub struct ArbitragePlan {
    pub buy_venue: String,
    pub buy_pair: String,
    pub buy_price: f64,
    pub sell_venue: String,
    pub sell_pair: String,
    pub sell_price: f64,
    /// Percentage spread between the cheapest and priciest venue.
    pub spread_pct: f64,
    /// Capital deployed, USD.
    pub trade_cap: f64,
    pub fee_buy: f64,
    pub fee_sell: f64,
    pub slip_buy: f64,
    pub slip_sell: f64,
    pub net_profit: f64,
    pub roi_pct: f64,
}

impl ArbitragePlan {
    pub fn total_fees(&self) -> f64 {
        self.fee_buy + self.fee_sell
    }

    pub fn total_slippage(&self) -> f64 {
        self.slip_buy + self.slip_sell
    }
}

/// Result of estimating one token's aggregated venue table.
///
/// Only `Plan` carries arithmetic; the other variants are normal,
/// non-error outcomes reported to the operator.
#[derive(Debug, Clone)]
pub enum ArbOutcome {
    /// Fewer than two DEX venues — no intra-DEX arbitrage possible.
    SingleVenue,
    /// Feasible trade size fell below the $1 floor.
    TooSmall { trade_cap: f64 },
    Plan(ArbitragePlan),
}
