use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{checked_price, de_price, get_json, PriceSource};
use crate::error::ProviderError;
use crate::models::Quote;
use crate::services::symbol_resolver::{self, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://api.coincap.io";

#[derive(Clone)]
pub struct CoinCapSource {
    http: Client,
    base_url: String,
}

/// `GET /v2/assets/bitcoin`
#[derive(Debug, Deserialize)]
pub struct AssetEnvelope {
    pub data: Asset,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "priceUsd", deserialize_with = "de_price")]
    pub price_usd: f64,
}

impl CoinCapSource {
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
impl PriceSource for CoinCapSource {
    fn name(&self) -> &'static str {
        ProviderKind::CoinCap.name()
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let asset_id = symbol_resolver::resolve(symbol, ProviderKind::CoinCap).ok_or_else(|| {
            ProviderError::Unresolved {
                provider: self.name(),
                symbol: symbol.to_string(),
            }
        })?;

        let url = format!("{}/v2/assets/{}", self.base_url, asset_id);
        let envelope: AssetEnvelope = get_json(self.name(), self.http.get(&url)).await?;

        let price = checked_price(self.name(), envelope.data.price_usd)?;
        debug!(asset = %envelope.data.id, price, "coincap price fetched");

        Ok(Quote::new(symbol, price, self.name()))
    }
}
