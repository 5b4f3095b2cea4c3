//! Ticker aggregation: raw per-pair quotes → one row per DEX venue.
//!
//! Pure function of its inputs; running it twice on the same snapshot
//! yields the same table.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{TickerRecord, VenueRow};

/// Running totals for one venue while grouping.
struct VenueAccum {
    pair: String,
    price_sum: f64,
    count: u32,
    volume_sum: f64,
}

/// Collapse raw tickers into a venue-aggregate table.
///
/// Records with a missing or non-positive USD price are dropped up front.
/// Surviving records are grouped by venue name (first pair string kept,
/// mean price, summed volume), filtered to venues whose lowercased name
/// contains at least one DEX keyword, and sorted by volume descending.
/// An empty table is a normal outcome, not an error.
pub fn aggregate(tickers: &[TickerRecord], dex_keywords: &[String]) -> Vec<VenueRow> {
    let mut groups: HashMap<String, VenueAccum> = HashMap::new();
    // Preserves first-seen order so "first pair" is well defined even
    // though HashMap iteration is not.
    let mut order: Vec<String> = Vec::new();

    let mut dropped = 0usize;
    for t in tickers {
        let price = match t.price_usd {
            Some(p) if p > 0.0 => p,
            _ => {
                dropped += 1;
                continue;
            }
        };

        match groups.get_mut(&t.venue) {
            Some(acc) => {
                acc.price_sum += price;
                acc.count += 1;
                acc.volume_sum += t.volume_usd;
            }
            None => {
                order.push(t.venue.clone());
                groups.insert(
                    t.venue.clone(),
                    VenueAccum {
                        pair: t.pair(),
                        price_sum: price,
                        count: 1,
                        volume_sum: t.volume_usd,
                    },
                );
            }
        }
    }

    let mut rows: Vec<VenueRow> = order
        .into_iter()
        .filter_map(|venue| {
            let acc = groups.remove(&venue)?;
            let lower = venue.to_lowercase();
            if !dex_keywords.iter().any(|w| lower.contains(w.as_str())) {
                return None;
            }
            Some(VenueRow {
                venue,
                pair: acc.pair,
                price: acc.price_sum / acc.count as f64,
                volume: acc.volume_sum,
            })
        })
        .collect();

    // Volume descending; venue name breaks ties deterministically.
    rows.sort_by(|a, b| {
        b.volume
            .partial_cmp(&a.volume)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.venue.cmp(&b.venue))
    });

    debug!(
        raw = tickers.len(),
        dropped_no_price = dropped,
        venues = rows.len(),
        "Tickers aggregated"
    );

    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
