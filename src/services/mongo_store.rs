use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{Client, Collection, Database};
use serde::Deserialize;
use tracing::warn;

use super::alert_store::{AlertStore, MarkOutcome};
use crate::error::StoreError;
use crate::models::{Alert, AlertStatus};

pub const ALERTS_COLLECTION: &str = "price_alerts";

#[derive(Debug, Clone, Deserialize)]
pub struct AlertDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub email: String,
    pub symbol: String,

    #[serde(default)]
    pub min_price: f64,
    #[serde(default)]
    pub max_price: f64,

    pub is_active: bool,
    pub status: AlertStatus,

    // unix seconds
    pub expires_at: i64,
    pub sent_at: Option<i64>,
}

impl AlertDocument {
    pub fn into_alert(self) -> Result<Alert, StoreError> {
        let expiry = Utc
            .timestamp_opt(self.expires_at, 0)
            .single()
            .ok_or_else(|| StoreError::Decode(format!("alert {} has bad expires_at", self.id)))?;

        Ok(Alert {
            id: self.id.to_hex(),
            recipient: self.email,
            symbol: self.symbol,
            min_price: self.min_price,
            max_price: self.max_price,
            active: self.is_active,
            status: self.status,
            expiry,
        })
    }
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(db_name)))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn alerts(&self) -> Collection<Document> {
        self.db.collection::<Document>(ALERTS_COLLECTION)
    }
}

#[async_trait]
impl AlertStore for MongoStore {
    async fn list_pending(&self) -> Result<Vec<Alert>, StoreError> {
        let mut cursor = self
            .alerts()
            .find(doc! { "is_active": true, "status": AlertStatus::Pending.as_str() }, None)
            .await?;

        let mut items: Vec<Alert> = Vec::new();
        while let Some(res) = cursor.next().await {
            let raw = res?;
            let decoded = mongodb::bson::from_document::<AlertDocument>(raw)
                .map_err(|e| StoreError::Decode(e.to_string()))
                .and_then(AlertDocument::into_alert);

            match decoded {
                Ok(alert) => items.push(alert),
                Err(e) => warn!("skipping undecodable alert document: {}", e),
            }
        }

        Ok(items)
    }

    async fn mark_sent(&self, id: &str) -> Result<MarkOutcome, StoreError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            warn!(id, "alert id is not an ObjectId, nothing to update");
            return Ok(MarkOutcome::Absent);
        };

        let res = self
            .alerts()
            .update_one(
                doc! { "_id": oid, "status": AlertStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": AlertStatus::Sent.as_str(),
                    "is_active": false,
                    "sent_at": Utc::now().timestamp(),
                } },
                None,
            )
            .await?;

        if res.matched_count > 0 {
            Ok(MarkOutcome::Updated)
        } else {
            Ok(MarkOutcome::Absent)
        }
    }
}
