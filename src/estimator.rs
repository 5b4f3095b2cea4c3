//! Naive cross-venue arbitrage estimate.
//!
//! Buys at the cheapest DEX venue, sells at the priciest, sizes the trade
//! against a capital ceiling and each leg's 24h volume, and charges taker
//! fees plus a volume-proportional slippage allowance on both legs. The
//! slippage term is notional × scaler × (trade size / leg volume), kept
//! exactly as specified, so it grows quadratically with trade size
//! relative to volume.

use tracing::debug;

use crate::config::ScannerConfig;
use crate::types::{ArbOutcome, ArbitragePlan, VenueRow};

/// Smallest trade worth reporting, USD.
const MIN_TRADE_USD: f64 = 1.0;

/// Estimate a synthetic arbitrage for one token's venue table.
///
/// Fewer than two venues, or a sub-dollar feasible size, are normal
/// outcomes reported via the corresponding `ArbOutcome` variants with no
/// further arithmetic.
pub fn estimate(rows: &[VenueRow], cfg: &ScannerConfig) -> ArbOutcome {
    if rows.len() < 2 {
        return ArbOutcome::SingleVenue;
    }

    let by_price = |a: &&VenueRow, b: &&VenueRow| {
        a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal)
    };
    let (Some(buy), Some(sell)) = (rows.iter().min_by(by_price), rows.iter().max_by(by_price))
    else {
        return ArbOutcome::SingleVenue;
    };

    let spread_pct = (sell.price - buy.price) / buy.price * 100.0;

    // Volumes floored at $1 so the size and slippage divisions stay sane.
    let vol_buy = buy.volume.max(1.0);
    let vol_sell = sell.volume.max(1.0);

    let trade_cap = cfg
        .max_capital_usd
        .min(vol_buy * cfg.volume_fraction)
        .min(vol_sell * cfg.volume_fraction);

    if trade_cap < MIN_TRADE_USD {
        return ArbOutcome::TooSmall { trade_cap };
    }

    let fee_buy = trade_cap * cfg.fee_rate;
    let tokens = (trade_cap - fee_buy) / buy.price;

    let gross_rev = tokens * sell.price;
    let fee_sell = gross_rev * cfg.fee_rate;

    let slip_buy = trade_cap * cfg.slippage_scaler * (trade_cap / vol_buy);
    let slip_sell = gross_rev * cfg.slippage_scaler * (trade_cap / vol_sell);

    let net_profit = gross_rev - fee_sell - slip_buy - fee_buy - slip_sell - trade_cap;
    let roi_pct = net_profit / trade_cap * 100.0;

    debug!(
        buy = %buy.venue,
        sell = %sell.venue,
        spread_pct,
        trade_cap,
        net_profit,
        "Arbitrage estimated"
    );

    ArbOutcome::Plan(ArbitragePlan {
        buy_venue: buy.venue.clone(),
        buy_pair: buy.pair.clone(),
        buy_price: buy.price,
        sell_venue: sell.venue.clone(),
        sell_pair: sell.pair.clone(),
        sell_price: sell.price,
        spread_pct,
        trade_cap,
        fee_buy,
        fee_sell,
        slip_buy,
        slip_sell,
        net_profit,
        roi_pct,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
