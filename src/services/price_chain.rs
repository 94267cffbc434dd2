use std::{sync::Arc, time::Duration};

use tokio::time;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::models::Quote;
use crate::services::providers::{checked_price, PriceSource};

/// One failed provider call inside a lookup.
#[derive(Debug)]
pub struct FailedAttempt {
    pub provider: &'static str,
    pub error: ProviderError,
}

#[derive(Debug)]
pub struct Lookup {
    pub quote: Option<Quote>,
    pub failures: Vec<FailedAttempt>,
}

/// Providers tried in priority order; the first usable price wins.
#[derive(Clone)]
pub struct PriceChain {
    sources: Vec<Arc<dyn PriceSource>>,
    timeout: Duration,
}

impl PriceChain {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn providers(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns `None` when every provider failed; the caller skips the symbol for this cycle.
    pub async fn fetch(&self, symbol: &str) -> Option<Quote> {
        self.lookup(symbol).await.quote
    }

    /// Like [`fetch`](Self::fetch) but also reports each failed attempt.
    /// Each provider is called at most once per lookup.
    pub async fn lookup(&self, symbol: &str) -> Lookup {
        let mut failures = Vec::new();

        for source in &self.sources {
            let provider = source.name();

            let outcome = match time::timeout(self.timeout, source.fetch(symbol)).await {
                Ok(res) => res,
                Err(_) => Err(ProviderError::Timeout { provider }),
            };
            // zero, negative or non-finite prices never reach the evaluator
            let outcome = outcome.and_then(|quote| {
                checked_price(provider, quote.price_usd)?;
                Ok(quote)
            });

            match outcome {
                Ok(quote) => {
                    debug!(symbol, provider, price = quote.price_usd, "quote resolved");
                    return Lookup {
                        quote: Some(quote),
                        failures,
                    };
                }
                Err(ProviderError::Unresolved { .. }) => {
                    debug!(symbol, provider, "provider has no identifier, skipping");
                }
                Err(error) => {
                    warn!(symbol, provider, %error, "price provider failed, falling back");
                    failures.push(FailedAttempt { provider, error });
                }
            }
        }

        warn!(symbol, attempts = failures.len(), "no provider could price symbol");
        Lookup {
            quote: None,
            failures,
        }
    }
}
