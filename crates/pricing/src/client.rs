//! Ticker price client.
//!
//! Async HTTP client using `reqwest` against a `/ticker/price?symbol=X`
//! endpoint. Every price is quoted against [`QUOTE_ASSET`].

use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://data.binance.com/api/v3";

/// Asset all prices are quoted in.
pub const QUOTE_ASSET: &str = "USDT";

/// Errors from the price client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("asked for {expected}, endpoint answered for {got}")]
    SymbolMismatch { expected: String, got: String },

    #[error("invalid price {0:?}")]
    InvalidPrice(String),
}

/// Raw ticker reply. The endpoint sends prices as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

/// Parses a ticker reply for `pair`, checking the echoed symbol.
pub fn parse_ticker(body: &[u8], pair: &str) -> Result<f64, Error> {
    let ticker: TickerPrice = serde_json::from_slice(body)?;
    if ticker.symbol != pair {
        return Err(Error::SymbolMismatch {
            expected: pair.to_string(),
            got: ticker.symbol,
        });
    }
    match ticker.price.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(Error::InvalidPrice(ticker.price)),
    }
}

/// Ticker price client.
pub struct PriceClient {
    http: reqwest::Client,
    base_url: String,
}

impl PriceClient {
    pub fn new() -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another endpoint root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Current price of `symbol` in [`QUOTE_ASSET`].
    pub async fn token_price(&self, symbol: &str) -> Result<f64, Error> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol == QUOTE_ASSET {
            return Ok(1.0);
        }
        let pair = format!("{symbol}{QUOTE_ASSET}");

        let url = format!("{}/ticker/price", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", pair.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let price = parse_ticker(&resp.bytes().await?, &pair)?;
        debug!(pair = %pair, price, "fetched ticker price");
        Ok(price)
    }

    /// Converts `amount` of `from` into `to`, crossing both through
    /// [`QUOTE_ASSET`].
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, Error> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(amount);
        }
        let from_price = self.token_price(from).await?;
        let to_price = self.token_price(to).await?;
        Ok(amount * from_price / to_price)
    }
}
