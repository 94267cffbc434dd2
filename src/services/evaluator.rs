use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use tokio::time;
use tracing::{debug, error, info, warn};

use super::alert_store::{AlertStore, MarkOutcome};
use super::notifier::Notifier;
use super::price_chain::PriceChain;
use super::symbol_resolver;
use crate::config::DeliveryPolicy;
use crate::error::{NotifyError, StoreError};
use crate::models::{Alert, Quote, TriggerKind};
use crate::templates::{self, Hbs};

#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
    pub max_concurrent_quotes: usize,
    pub delivery_policy: DeliveryPolicy,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(10),
            max_concurrent_quotes: 4,
            delivery_policy: DeliveryPolicy::AtMostOnce,
        }
    }
}

/// Counters for one cycle, logged by the monitor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub symbols: usize,
    pub unavailable: usize,
    pub expired: usize,
    pub triggered: usize,
    pub notified: usize,
    pub notify_failed: usize,
    pub marked: usize,
    pub mark_failed: usize,
}

pub struct Evaluator {
    chain: PriceChain,
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    hbs: Hbs,
    options: EvaluatorOptions,
}

/// Canonical grouping key for an alert's symbol.
pub fn group_key(symbol: &str) -> String {
    symbol_resolver::normalize(symbol).unwrap_or_else(|| symbol.trim().to_uppercase())
}

/// Partitions candidate alerts by symbol. Inactive, already Sent and inert
/// (both bounds disabled) alerts are dropped here and never cause a price lookup.
pub fn group_by_symbol(alerts: Vec<Alert>) -> BTreeMap<String, Vec<Alert>> {
    let mut by_symbol: BTreeMap<String, Vec<Alert>> = BTreeMap::new();
    for a in alerts {
        if !a.is_candidate() || !a.is_actionable() {
            continue;
        }
        by_symbol.entry(group_key(&a.symbol)).or_default().push(a);
    }
    by_symbol
}

impl Evaluator {
    pub fn new(
        chain: PriceChain,
        store: Arc<dyn AlertStore>,
        notifier: Arc<dyn Notifier>,
        hbs: Hbs,
        options: EvaluatorOptions,
    ) -> Self {
        Self {
            chain,
            store,
            notifier,
            hbs,
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn AlertStore> {
        &self.store
    }

    /// Evaluates one batch of pending alerts against a single quote per symbol.
    /// Never fails: every per-symbol and per-alert problem is logged and counted.
    pub async fn run_cycle(&self, alerts: Vec<Alert>, now: DateTime<Utc>) -> CycleReport {
        let by_symbol = group_by_symbol(alerts);
        let mut report = CycleReport {
            symbols: by_symbol.len(),
            ..CycleReport::default()
        };

        if by_symbol.is_empty() {
            return report;
        }

        let quotes = self.fetch_quotes(by_symbol.keys().cloned().collect()).await;

        for (sym, group) in by_symbol {
            let Some(quote) = quotes.get(&sym).and_then(Option::as_ref) else {
                warn!(symbol = %sym, alerts = group.len(), "price unavailable, skipping symbol this cycle");
                report.unavailable += 1;
                continue;
            };

            info!(symbol = %sym, price = quote.price_usd, source = quote.source, "quote");

            for a in &group {
                if a.is_expired(now) {
                    debug!(id = %a.id, "alert expired, skipping");
                    report.expired += 1;
                    continue;
                }

                if let Some(kind) = a.evaluate(quote.price_usd) {
                    report.triggered += 1;
                    self.fire(a, kind, quote, &mut report).await;
                }
            }
        }

        report
    }

    /// One lookup per distinct symbol, at most `max_concurrent_quotes` in flight.
    async fn fetch_quotes(&self, symbols: Vec<String>) -> HashMap<String, Option<Quote>> {
        let limit = self.options.max_concurrent_quotes.max(1);

        stream::iter(symbols)
            .map(|sym| async move {
                let quote = self.chain.fetch(&sym).await;
                (sym, quote)
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }

    async fn fire(&self, a: &Alert, kind: TriggerKind, quote: &Quote, report: &mut CycleReport) {
        info!(id = %a.id, symbol = %a.symbol, trigger = %kind, price = quote.price_usd, "alert triggered");

        match self.notify(a, kind, quote).await {
            Ok(()) => {
                info!(id = %a.id, recipient = %a.recipient, "notification sent");
                report.notified += 1;
            }
            Err(e) => {
                warn!(id = %a.id, recipient = %a.recipient, error = %e, "notification failed");
                report.notify_failed += 1;

                if self.options.delivery_policy == DeliveryPolicy::RequireDelivery {
                    warn!(id = %a.id, "leaving alert pending until delivery succeeds");
                    return;
                }
            }
        }

        match self.mark_sent(&a.id).await {
            Ok(MarkOutcome::Updated) => report.marked += 1,
            Ok(MarkOutcome::Absent) => {
                info!(id = %a.id, "alert no longer pending in store, nothing to update");
            }
            Err(e) => {
                error!(id = %a.id, error = %e, "failed to mark alert as sent");
                report.mark_failed += 1;
            }
        }
    }

    async fn notify(&self, a: &Alert, kind: TriggerKind, quote: &Quote) -> Result<(), NotifyError> {
        let msg = templates::render_alert(&self.hbs, kind, &quote.symbol, quote.price_usd)?;
        let limit = self.options.notify_timeout;

        match time::timeout(limit, self.notifier.send(&a.recipient, &msg.subject, &msg.body)).await {
            Ok(res) => res,
            Err(_) => Err(NotifyError::Timeout(limit)),
        }
    }

    async fn mark_sent(&self, id: &str) -> Result<MarkOutcome, StoreError> {
        let limit = self.options.store_timeout;

        match time::timeout(limit, self.store.mark_sent(id)).await {
            Ok(res) => res,
            Err(_) => Err(StoreError::Timeout(limit)),
        }
    }
}
