mod common;

use std::sync::Arc;
use std::time::Instant;

use pricealert::error::ProviderError;
use pricealert::services::price_chain::PriceChain;
use pricealert::services::providers::{BinanceSource, CoinCapSource, CoinbaseSource, PriceSource};

use common::{chain, Behavior, MockSource, CHAIN_TIMEOUT};

#[tokio::test]
async fn falls_back_to_second_provider() {
    let first = MockSource::new("first", Behavior::Fail);
    let second = MockSource::new("second", Behavior::Price(50_000.0));
    let third = MockSource::new("third", Behavior::Price(1.0));

    let lookup = chain(&[first.clone(), second.clone(), third.clone()])
        .lookup("BTCUSDT")
        .await;

    let quote = lookup.quote.expect("quote");
    assert_eq!(quote.price_usd, 50_000.0);
    assert_eq!(quote.source, "second");
    assert_eq!(quote.symbol, "BTCUSDT");

    assert_eq!(first.calls_for("BTCUSDT"), 1);
    assert_eq!(second.calls_for("BTCUSDT"), 1);
    assert_eq!(third.total_calls(), 0);

    assert_eq!(lookup.failures.len(), 1);
    assert_eq!(lookup.failures[0].provider, "first");
}

#[tokio::test]
async fn parse_failure_counts_as_provider_failure() {
    let first = MockSource::new("first", Behavior::Garbage);
    let second = MockSource::new("second", Behavior::Price(42.0));

    let lookup = chain(&[first, second]).lookup("ETHUSDT").await;

    assert_eq!(lookup.quote.map(|q| q.source), Some("second"));
    assert!(matches!(lookup.failures[0].error, ProviderError::Parse { .. }));
}

#[tokio::test]
async fn hung_provider_times_out_and_falls_through() {
    let slow = MockSource::new("slow", Behavior::Hang);
    let fast = MockSource::new("fast", Behavior::Price(7.0));

    let started = Instant::now();
    let lookup = chain(&[slow, fast]).lookup("DOGEUSDT").await;

    assert!(started.elapsed() < CHAIN_TIMEOUT * 10);
    assert_eq!(lookup.quote.map(|q| q.price_usd), Some(7.0));
    assert!(matches!(lookup.failures[0].error, ProviderError::Timeout { provider: "slow" }));
}

#[tokio::test]
async fn all_providers_failing_is_unavailable() {
    let a = MockSource::new("a", Behavior::Fail);
    let b = MockSource::new("b", Behavior::Garbage);

    let chain = chain(&[a.clone(), b.clone()]);
    assert!(chain.fetch("BTCUSDT").await.is_none());

    assert_eq!(a.calls_for("BTCUSDT"), 1);
    assert_eq!(b.calls_for("BTCUSDT"), 1);
}

#[tokio::test]
async fn unresolved_symbol_skips_provider_without_network() {
    let http = reqwest::Client::new();
    let coincap = CoinCapSource::with_base_url(http.clone(), "http://127.0.0.1:9");

    let err = coincap.fetch("PEPEUSDT").await.unwrap_err();
    assert!(matches!(err, ProviderError::Unresolved { provider: "coincap", .. }));

    let binance = BinanceSource::with_base_url(http.clone(), "http://127.0.0.1:9");
    let coinbase = CoinbaseSource::with_base_url(http, "http://127.0.0.1:9");
    assert!(matches!(binance.fetch("XAUUSD").await, Err(ProviderError::Unresolved { .. })));
    assert!(matches!(coinbase.fetch("XAUUSD").await, Err(ProviderError::Unresolved { .. })));
}

#[tokio::test]
async fn unresolved_provider_is_not_a_failed_attempt() {
    let coincap: Arc<dyn PriceSource> =
        Arc::new(CoinCapSource::with_base_url(reqwest::Client::new(), "http://127.0.0.1:9"));
    let backup = MockSource::new("backup", Behavior::Price(0.00001));

    let chain = PriceChain::new(vec![coincap, backup.clone()], CHAIN_TIMEOUT);
    let lookup = chain.lookup("PEPEUSDT").await;

    assert_eq!(lookup.quote.map(|q| q.source), Some("backup"));
    assert!(lookup.failures.is_empty());
    assert_eq!(chain.providers(), vec!["coincap", "backup"]);
}

#[tokio::test]
async fn non_positive_price_falls_through_to_next_provider() {
    let zero = MockSource::new("zero", Behavior::Price(0.0));
    let negative = MockSource::new("negative", Behavior::Price(-1.0));
    let good = MockSource::new("good", Behavior::Price(50_000.0));

    let lookup = chain(&[zero.clone(), negative.clone(), good.clone()])
        .lookup("BTCUSDT")
        .await;

    let quote = lookup.quote.expect("quote");
    assert_eq!(quote.source, "good");
    assert_eq!(quote.price_usd, 50_000.0);

    assert_eq!(lookup.failures.len(), 2);
    assert!(matches!(lookup.failures[0].error, ProviderError::InvalidPrice { provider: "zero", .. }));
    assert!(matches!(lookup.failures[1].error, ProviderError::InvalidPrice { provider: "negative", .. }));
}

#[tokio::test]
async fn only_invalid_prices_is_unavailable() {
    let nan = MockSource::new("nan", Behavior::Price(f64::NAN));
    let zero = MockSource::new("zero", Behavior::Price(0.0));

    assert!(chain(&[nan, zero]).fetch("BTCUSDT").await.is_none());
}
