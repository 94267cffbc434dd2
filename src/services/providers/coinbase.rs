use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{checked_price, de_price, get_json, PriceSource};
use crate::error::ProviderError;
use crate::models::Quote;
use crate::services::symbol_resolver::{self, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://api.coinbase.com";

#[derive(Clone)]
pub struct CoinbaseSource {
    http: Client,
    base_url: String,
}

/// `GET /v2/prices/BTC-USD/spot`
#[derive(Debug, Deserialize)]
pub struct SpotEnvelope {
    pub data: SpotPrice,
}

#[derive(Debug, Deserialize)]
pub struct SpotPrice {
    #[serde(deserialize_with = "de_price")]
    pub amount: f64,
    pub currency: Option<String>,
}

impl CoinbaseSource {
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
impl PriceSource for CoinbaseSource {
    fn name(&self) -> &'static str {
        ProviderKind::Coinbase.name()
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let pair = symbol_resolver::resolve(symbol, ProviderKind::Coinbase).ok_or_else(|| {
            ProviderError::Unresolved {
                provider: self.name(),
                symbol: symbol.to_string(),
            }
        })?;

        let url = format!("{}/v2/prices/{}/spot", self.base_url, pair);
        let envelope: SpotEnvelope = get_json(self.name(), self.http.get(&url)).await?;

        if let Some(currency) = envelope.data.currency.as_deref() {
            if !currency.eq_ignore_ascii_case("USD") {
                return Err(ProviderError::Parse {
                    provider: self.name(),
                    message: format!("expected USD quote, got {currency}"),
                });
            }
        }

        let price = checked_price(self.name(), envelope.data.amount)?;
        debug!(pair = %pair, price, "coinbase price fetched");

        Ok(Quote::new(symbol, price, self.name()))
    }
}
