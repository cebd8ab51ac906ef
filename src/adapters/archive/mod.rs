//! Archive Adapter — MongoDB-backed latest/history persistence.
//!
//! The original service persists to Couchbase; no Couchbase driver
//! exists in this dependency set, so this reuses the MongoDB driver
//! already pulled in for the subscription store (see DESIGN.md).

use async_trait::async_trait;
use mongodb::bson::{doc, to_document};
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::config::MongoConfig;
use crate::domain::PolymarketEvent;
use crate::error::ArchiveError;
use crate::ports::archive::ArchiveStore;

pub struct MongoArchiveStore {
    collection: Collection<mongodb::bson::Document>,
}

impl MongoArchiveStore {
    pub async fn connect(config: &MongoConfig) -> anyhow::Result<Self> {
        info!(
            database = %config.database,
            collection = %config.collection,
            "connecting to MongoDB archive store"
        );
        let client = Client::with_uri_str(&config.uri).await?;
        let database: Database = client.database(&config.database);
        let collection = database.collection(&config.collection);
        Ok(Self { collection })
    }

    async fn upsert(
        &self,
        key: &str,
        doc_type: &str,
        event: &PolymarketEvent,
    ) -> Result<(), ArchiveError> {
        let mut body = to_document(event).map_err(|e| ArchiveError::Write {
            key: key.to_string(),
            source: e.into(),
        })?;
        body.insert("type", doc_type);
        body.insert("_archive_key", key);

        self.collection
            .update_one(doc! { "_archive_key": key }, doc! { "$set": body })
            .upsert(true)
            .await
            .map_err(|e| ArchiveError::Write {
                key: key.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for MongoArchiveStore {
    async fn upsert_latest(&self, event: &PolymarketEvent) -> Result<(), ArchiveError> {
        let key = format!("market::{}", event.market_id);
        self.upsert(&key, "market_latest", event).await
    }

    async fn upsert_history(&self, event: &PolymarketEvent) -> Result<(), ArchiveError> {
        let key = format!("event::{}", event.event_id);
        self.upsert(&key, "conviction_event", event).await
    }
}
