//! Alert store backed by a Supabase table through its PostgREST endpoint.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{header, Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::alert_store::{AlertStore, MarkOutcome};
use super::providers::de_price;
use crate::error::StoreError;
use crate::models::{Alert, AlertStatus};

#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    base_url: String,
    key: String,
    table: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Text(String),
    Int(i64),
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn de_bound<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "de_price")] f64);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0).unwrap_or(0.0))
}

/// Row shape of the `price_alerts` table.
#[derive(Debug, Deserialize)]
struct PriceAlertRow {
    id: RowId,
    email: Option<String>,
    #[serde(default = "default_symbol")]
    symbol: String,
    #[serde(default, deserialize_with = "de_bound")]
    min_price: f64,
    #[serde(default, deserialize_with = "de_bound")]
    max_price: f64,
    is_active: bool,
    status: AlertStatus,
    expiry_date: String,
}

/// Accepts `timestamptz` (RFC 3339) as well as zone-less `timestamp` columns, read as UTC.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output, e.g. `2025-03-01 12:30:00+00`
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl TryFrom<PriceAlertRow> for Alert {
    type Error = StoreError;

    fn try_from(row: PriceAlertRow) -> Result<Self, Self::Error> {
        let id = match row.id {
            RowId::Text(s) => s,
            RowId::Int(n) => n.to_string(),
        };

        let recipient = row
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("alert {id} has no email")))?;

        let expiry = parse_expiry(&row.expiry_date)
            .ok_or_else(|| StoreError::Decode(format!("alert {id} has bad expiry_date {:?}", row.expiry_date)))?;

        Ok(Alert {
            id,
            recipient,
            symbol: row.symbol,
            min_price: row.min_price,
            max_price: row.max_price,
            active: row.is_active,
            status: row.status,
            expiry,
        })
    }
}

impl SupabaseStore {
    pub fn new(http: Client, base_url: &str, key: &str, table: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            table: table.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(header::ACCEPT, "application/json")
    }

    /// Decodes a PostgREST result set, dropping rows that do not match the table shape.
    pub fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<Alert> {
        rows.into_iter()
            .filter_map(|raw| {
                match serde_json::from_value::<PriceAlertRow>(raw)
                    .map_err(|e| StoreError::Decode(e.to_string()))
                    .and_then(Alert::try_from)
                {
                    Ok(alert) => Some(alert),
                    Err(e) => {
                        warn!("skipping undecodable alert row: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AlertStore for SupabaseStore {
    async fn list_pending(&self) -> Result<Vec<Alert>, StoreError> {
        let res = self
            .authed(self.http.get(self.endpoint()))
            .query(&[
                ("select", "*"),
                ("is_active", "eq.true"),
                ("status", "eq.PENDING"),
            ])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = ensure_success(res).await?.json().await?;
        debug!(rows = rows.len(), "pending alerts listed");

        Ok(Self::decode_rows(rows))
    }

    async fn mark_sent(&self, id: &str) -> Result<MarkOutcome, StoreError> {
        let id_filter = format!("eq.{id}");
        let res = self
            .authed(self.http.patch(self.endpoint()))
            .query(&[("id", id_filter.as_str()), ("status", "eq.PENDING")])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": AlertStatus::Sent.as_str(), "is_active": false }))
            .send()
            .await?;

        let updated: Vec<serde_json::Value> = ensure_success(res).await?.json().await?;

        if updated.is_empty() {
            Ok(MarkOutcome::Absent)
        } else {
            Ok(MarkOutcome::Updated)
        }
    }
}
