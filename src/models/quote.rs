use chrono::{DateTime, Utc};
use serde::Serialize;

/// A price observation for one symbol, valid only inside the cycle that fetched it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price_usd: f64,
    pub source: &'static str,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price_usd: f64, source: &'static str) -> Self {
        Self {
            symbol: symbol.into(),
            price_usd,
            source,
            observed_at: Utc::now(),
        }
    }
}
