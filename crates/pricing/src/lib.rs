//! Exchange-rate lookups used to present cost quotes in token terms.
//!
//! Not on the transfer path: admission works in the store's own cost unit.

pub mod client;

pub use client::{DEFAULT_BASE_URL, Error, PriceClient, QUOTE_ASSET, TickerPrice, parse_ticker};
