use std::sync::Arc;

use tracing::info;

use crate::config::{Settings, StoreBackend};
use crate::error::StartupError;
use crate::services::alert_monitor::AlertMonitor;
use crate::services::alert_store::AlertStore;
use crate::services::db_init;
use crate::services::evaluator::{Evaluator, EvaluatorOptions};
use crate::services::mongo_store::MongoStore;
use crate::services::notifier::ResendNotifier;
use crate::services::price_chain::PriceChain;
use crate::services::providers::{self, BinanceSource, CoinCapSource, CoinbaseSource, PriceSource};
use crate::services::supabase_store::SupabaseStore;
use crate::templates;

/// Providers in priority order.
pub fn default_sources(http: reqwest::Client) -> Vec<Arc<dyn PriceSource>> {
    vec![
        Arc::new(BinanceSource::new(http.clone())),
        Arc::new(CoinbaseSource::new(http.clone())),
        Arc::new(CoinCapSource::new(http)),
    ]
}

pub async fn open_store(settings: &Settings, http: reqwest::Client) -> Result<Arc<dyn AlertStore>, StartupError> {
    let store: Arc<dyn AlertStore> = match &settings.store {
        StoreBackend::Supabase { url, key, table } => {
            info!(url = %url, table = %table, "using supabase alert store");
            Arc::new(SupabaseStore::new(http, url, key, table))
        }
        StoreBackend::Mongo { uri, db } => {
            let store = MongoStore::connect(uri, db).await?;
            db_init::ensure_indexes(store.database()).await?;
            info!(db = %db, "using mongodb alert store");
            Arc::new(store)
        }
    };

    Ok(store)
}

/// Builds the monitor with one shared HTTP handle per concern.
pub async fn build_monitor(settings: &Settings) -> Result<AlertMonitor, StartupError> {
    let quote_http = providers::http_client(settings.provider_timeout)?;
    let store_http = providers::http_client(settings.store_timeout)?;
    let notify_http = providers::http_client(settings.notify_timeout)?;

    let chain = PriceChain::new(default_sources(quote_http), settings.provider_timeout);
    info!(providers = ?chain.providers(), "price chain ready");

    let store = open_store(settings, store_http).await?;
    let notifier = Arc::new(ResendNotifier::new(
        notify_http,
        settings.resend_api_key.clone(),
        settings.notify_from.clone(),
    ));

    let evaluator = Evaluator::new(
        chain,
        store,
        notifier,
        templates::build_handlebars(),
        EvaluatorOptions {
            store_timeout: settings.store_timeout,
            notify_timeout: settings.notify_timeout,
            max_concurrent_quotes: settings.max_concurrent_quotes,
            delivery_policy: settings.delivery_policy,
        },
    );

    Ok(AlertMonitor::new(evaluator, settings.poll_interval, settings.store_timeout))
}
