//! Swap token list generator: fetches token lists, market data, and partner
//! catalogs from several providers, merges them into one catalog per
//! supported network, and writes the results as static JSON artifacts.

pub mod aggregator;
pub mod chains;
pub mod oracle;
pub mod output;
pub mod pricefeed;
pub mod runner;
pub mod sources;
pub mod types;
