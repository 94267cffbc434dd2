use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{checked_price, de_price, get_json, PriceSource};
use crate::error::ProviderError;
use crate::models::Quote;
use crate::services::symbol_resolver::{self, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://api.binance.us";

#[derive(Clone)]
pub struct BinanceSource {
    http: Client,
    base_url: String,
}

/// `GET /api/v3/ticker/price?symbol=BTCUSDT`
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
}

impl BinanceSource {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    fn name(&self) -> &'static str {
        ProviderKind::Binance.name()
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let id = symbol_resolver::resolve(symbol, ProviderKind::Binance).ok_or_else(|| {
            ProviderError::Unresolved {
                provider: self.name(),
                symbol: symbol.to_string(),
            }
        })?;

        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let ticker: TickerPrice =
            get_json(self.name(), self.http.get(&url).query(&[("symbol", id.as_str())])).await?;

        let price = checked_price(self.name(), ticker.price)?;
        debug!(ticker = %ticker.symbol, price, "binance price fetched");

        Ok(Quote::new(symbol, price, self.name()))
    }
}
