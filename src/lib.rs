//! DEXSCAN — intra-DEX arbitrage scanner.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod aggregate;
pub mod coingecko;
pub mod config;
pub mod error;
pub mod estimator;
pub mod report;
pub mod scanner;
pub mod types;
