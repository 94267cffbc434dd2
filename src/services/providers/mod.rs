//! Price provider adapters.
//!
//! Every adapter resolves the nominal symbol through the symbol resolver, issues a
//! single fresh GET and decodes the body into its own response struct.

pub mod binance;
pub mod coinbase;
pub mod coincap;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, RequestBuilder};
use serde::{de, Deserialize, Deserializer};

use crate::error::ProviderError;
use crate::models::Quote;

pub use binance::BinanceSource;
pub use coinbase::CoinbaseSource;
pub use coincap::CoinCapSource;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError>;
}

/// Shared HTTP handle for all providers. The client-level timeout backs up the
/// per-call timeout enforced by the chain.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("price-alert-worker/", env!("CARGO_PKG_VERSION")))
        .build()
}

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Adds no-cache directives and a unique query parameter so no intermediary can
/// answer with a stale price.
pub(crate) fn fresh(req: RequestBuilder) -> RequestBuilder {
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    let nonce = format!("{}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default(), seq);

    req.query(&[("_nc", nonce)])
        .header(header::CACHE_CONTROL, "no-cache, no-store, max-age=0")
        .header(header::PRAGMA, "no-cache")
}

/// Sends the request and decodes the JSON body into `T`.
pub(crate) async fn get_json<T>(provider: &'static str, req: RequestBuilder) -> Result<T, ProviderError>
where
    T: de::DeserializeOwned,
{
    let res = fresh(req).send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Http(e)
        }
    })?;

    let status = res.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    let body = res.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| ProviderError::Parse {
        provider,
        message: e.to_string(),
    })
}

pub(crate) fn checked_price(provider: &'static str, price: f64) -> Result<f64, ProviderError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ProviderError::InvalidPrice { provider, price })
    }
}

/// Accepts a price as a JSON number or a numeric string. Anything else fails decoding.
pub(crate) fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("price {s:?} is not numeric"))),
    }
}
