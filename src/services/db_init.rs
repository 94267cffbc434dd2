use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};

use super::mongo_store::ALERTS_COLLECTION;
use crate::error::StoreError;

pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    let col = db.collection::<mongodb::bson::Document>(ALERTS_COLLECTION);

    // pending scan: is_active + status, grouped by symbol
    let model = IndexModel::builder()
        .keys(doc! { "is_active": 1, "status": 1, "symbol": 1 })
        .options(IndexOptions::builder().name("pending_scan".to_string()).build())
        .build();

    col.create_index(model, None).await?;

    Ok(())
}
