//! Console rendering for the operator.
//!
//! Tabular venue summaries and the arbitrage-plan narrative. Everything
//! here returns strings; callers print them.

use crate::types::{ArbitragePlan, VenueRow};

/// Format a USD amount with thousands separators, e.g. `$1,234.57`.
pub fn fmt_usd(value: f64, decimals: usize) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.decimals$}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}${grouped}.{f}"),
        None => format!("{sign}${grouped}"),
    }
}

/// Render the venue-aggregate table with aligned columns.
pub fn render_table(rows: &[VenueRow]) -> String {
    let price_cells: Vec<String> = rows.iter().map(|r| fmt_usd(r.price, 6)).collect();
    let volume_cells: Vec<String> = rows.iter().map(|r| fmt_usd(r.volume, 0)).collect();

    let w_market = rows
        .iter()
        .map(|r| r.venue.len())
        .chain(["Market".len()])
        .max()
        .unwrap_or(0);
    let w_pair = rows
        .iter()
        .map(|r| r.pair.len())
        .chain(["Pair".len()])
        .max()
        .unwrap_or(0);
    let w_price = price_cells
        .iter()
        .map(|c| c.len())
        .chain(["Price".len()])
        .max()
        .unwrap_or(0);
    let w_volume = volume_cells
        .iter()
        .map(|c| c.len())
        .chain(["Volume".len()])
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<w_market$}  {:<w_pair$}  {:>w_price$}  {:>w_volume$}",
        "Market", "Pair", "Price", "Volume"
    );
    for (i, r) in rows.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!(
            "{:<w_market$}  {:<w_pair$}  {:>w_price$}  {:>w_volume$}",
            r.venue, r.pair, price_cells[i], volume_cells[i]
        ));
    }
    out
}

/// Render the arbitrage-plan narrative block.
pub fn render_plan(p: &ArbitragePlan) -> String {
    format!(
        "\nArbitrage plan:\n\
         • Capital deployed      : {}\n\
         • Expected spread       : {:.2} %\n\
         • Fees (both legs)      : {}\n\
         • Slippage allowance    : {}\n\
         → Net P/L              : {}   ({:.2} % ROI)\n\
         Path: buy **{}** on **{}** @ {}  →  sell on **{}** @ {}",
        fmt_usd(p.trade_cap, 2),
        p.spread_pct,
        fmt_usd(p.total_fees(), 2),
        fmt_usd(p.total_slippage(), 2),
        fmt_usd(p.net_profit, 2),
        p.roi_pct,
        p.buy_pair,
        p.buy_venue,
        fmt_usd(p.buy_price, 6),
        p.sell_venue,
        fmt_usd(p.sell_price, 6),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
