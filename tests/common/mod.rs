#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use pricealert::config::DeliveryPolicy;
use pricealert::error::{NotifyError, ProviderError, StoreError};
use pricealert::models::{Alert, AlertStatus, Quote};
use pricealert::services::alert_store::{AlertStore, MarkOutcome};
use pricealert::services::evaluator::{Evaluator, EvaluatorOptions};
use pricealert::services::notifier::Notifier;
use pricealert::services::price_chain::PriceChain;
use pricealert::services::providers::PriceSource;
use pricealert::templates;

pub const CHAIN_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Price(f64),
    Fail,
    Garbage,
    Hang,
}

/// Price source that counts calls per symbol.
pub struct MockSource {
    name: &'static str,
    behavior: Mutex<Behavior>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockSource {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior: Mutex::new(behavior),
            calls: Mutex::new(HashMap::new()),
        })
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PriceSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        *self.calls.lock().unwrap().entry(symbol.to_string()).or_default() += 1;
        let behavior = *self.behavior.lock().unwrap();

        match behavior {
            Behavior::Price(p) => Ok(Quote::new(symbol, p, self.name)),
            Behavior::Fail => Err(ProviderError::Status {
                provider: self.name,
                status: 503,
            }),
            Behavior::Garbage => Err(ProviderError::Parse {
                provider: self.name,
                message: "missing field `price`".to_string(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung provider should have been timed out")
            }
        }
    }
}

pub fn chain(sources: &[Arc<MockSource>]) -> PriceChain {
    let sources: Vec<Arc<dyn PriceSource>> = sources
        .iter()
        .map(|s| s.clone() as Arc<dyn PriceSource>)
        .collect();
    PriceChain::new(sources, CHAIN_TIMEOUT)
}

#[derive(Default)]
pub struct MemoryStore {
    alerts: tokio::sync::Mutex<HashMap<String, Alert>>,
    pub fail_list: AtomicBool,
    pub fail_mark_ids: Mutex<Vec<String>>,
    pub mark_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with(alerts: Vec<Alert>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.alerts.try_lock().unwrap();
            for a in alerts {
                map.insert(a.id.clone(), a);
            }
        }
        Arc::new(store)
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.lock().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) {
        self.alerts.lock().await.remove(id);
    }

    pub fn fail_mark_for(&self, id: &str) {
        self.fail_mark_ids.lock().unwrap().push(id.to_string());
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn list_pending(&self) -> Result<Vec<Alert>, StoreError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Decode("store offline".to_string()));
        }

        let mut items: Vec<Alert> = self
            .alerts
            .lock()
            .await
            .values()
            .filter(|a| a.is_candidate())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn mark_sent(&self, id: &str) -> Result<MarkOutcome, StoreError> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_mark_ids.lock().unwrap().iter().any(|x| x == id) {
            return Err(StoreError::Status {
                status: 500,
                body: "update failed".to_string(),
            });
        }

        let mut map = self.alerts.lock().await;
        match map.get_mut(id) {
            Some(a) if a.status == AlertStatus::Pending => {
                a.mark_sent();
                Ok(MarkOutcome::Updated)
            }
            _ => Ok(MarkOutcome::Absent),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub attempts: AtomicUsize,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 422,
                body: "invalid recipient".to_string(),
            });
        }

        self.sent.lock().unwrap().push(Sent {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn evaluator(
    sources: &[Arc<MockSource>],
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    delivery_policy: DeliveryPolicy,
) -> Evaluator {
    Evaluator::new(
        chain(sources),
        store,
        notifier,
        templates::build_handlebars(),
        EvaluatorOptions {
            store_timeout: Duration::from_millis(500),
            notify_timeout: Duration::from_millis(500),
            max_concurrent_quotes: 4,
            delivery_policy,
        },
    )
}

pub fn alert(id: &str, symbol: &str, min: f64, max: f64) -> Alert {
    Alert {
        id: id.to_string(),
        recipient: format!("{id}@example.com"),
        symbol: symbol.to_string(),
        min_price: min,
        max_price: max,
        active: true,
        status: AlertStatus::Pending,
        expiry: Utc::now() + ChronoDuration::days(7),
    }
}
