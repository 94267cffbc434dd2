use std::{env, time::Duration};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase { url: String, key: String, table: String },
    Mongo { uri: String, db: String },
}

/// What happens to a triggered alert when the notification could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Mark the alert Sent regardless of the notifier outcome. The alert never fires twice,
    /// but a failed notification is lost.
    #[default]
    AtMostOnce,
    /// Leave the alert Pending when the notifier fails so the next cycle tries again.
    RequireDelivery,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreBackend,

    pub resend_api_key: String,
    pub notify_from: String,

    pub host: String,
    pub port: u16,

    pub poll_interval: Duration,
    pub provider_timeout: Duration,
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
    pub max_concurrent_quotes: usize,
    pub delivery_policy: DeliveryPolicy,
}

pub fn load() -> Result<Settings, ConfigError> {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    load_with(|name| env::var(name).ok())
}

/// Builds settings from an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

    let store = match get("STORE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
        None | Some("supabase") => StoreBackend::Supabase {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            key: required("SUPABASE_KEY")?,
            table: get("SUPABASE_TABLE").unwrap_or_else(|| "price_alerts".to_string()),
        },
        Some("mongodb") | Some("mongo") => StoreBackend::Mongo {
            uri: required("MONGODB_URI")?,
            db: get("MONGODB_DB").unwrap_or_else(|| "pricealert".to_string()),
        },
        Some(other) => {
            return Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: other.to_string(),
            });
        }
    };

    let resend_api_key = required("RESEND_API_KEY")?;
    let notify_from = get("NOTIFY_FROM")
        .unwrap_or_else(|| "Price Alert Bot <noreply@pricealert.local>".to_string());

    let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = parse_or("PORT", get("PORT"), 8080u16)?;

    let secs = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
        let value = parse_or(name, get(name), default)?;
        if value == 0 {
            return Err(ConfigError::Invalid { name, value: "0".to_string() });
        }
        Ok(Duration::from_secs(value))
    };

    let max_concurrent_quotes = parse_or("MAX_CONCURRENT_QUOTES", get("MAX_CONCURRENT_QUOTES"), 4usize)?.max(1);

    let delivery_policy = match get("DELIVERY_POLICY").as_deref().map(str::to_lowercase).as_deref() {
        None | Some("at_most_once") => DeliveryPolicy::AtMostOnce,
        Some("require_delivery") => DeliveryPolicy::RequireDelivery,
        Some(other) => {
            return Err(ConfigError::Invalid {
                name: "DELIVERY_POLICY",
                value: other.to_string(),
            });
        }
    };

    Ok(Settings {
        store,
        resend_api_key,
        notify_from,
        host,
        port,
        poll_interval: secs("POLL_INTERVAL_SECS", 10)?,
        provider_timeout: secs("PROVIDER_TIMEOUT_SECS", 5)?,
        store_timeout: secs("STORE_TIMEOUT_SECS", 10)?,
        notify_timeout: secs("NOTIFY_TIMEOUT_SECS", 10)?,
        max_concurrent_quotes,
        delivery_policy,
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse::<T>().map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}
