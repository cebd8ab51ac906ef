//! Subscription Store Adapter — MongoDB-backed active-subscription store.

use async_trait::async_trait;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection};
use tracing::{debug, error, info};

use crate::config::MongoConfig;
use crate::domain::Subscription;
use crate::error::SubscriptionStoreError;
use crate::ports::subscription_store::{SubscribeOverrides, SubscriptionStore};

/// MongoDB-backed implementation of the subscription store port.
///
/// Subscriptions are documents in `{database}.{collection}`, keyed by
/// `market_id`, with reference counting maintained via atomic `$inc`.
pub struct MongoSubscriptionStore {
    collection: Collection<Document>,
}

impl MongoSubscriptionStore {
    pub async fn connect(config: &MongoConfig) -> anyhow::Result<Self> {
        info!(
            database = %config.database,
            collection = %config.collection,
            "connecting to MongoDB subscription store"
        );
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        Ok(Self { collection })
    }
}

fn to_subscription(doc: Document) -> Option<Subscription> {
    let mut doc = doc;
    doc.remove("_id");
    match mongodb::bson::from_document::<Subscription>(doc) {
        Ok(sub) => Some(sub),
        Err(e) => {
            error!(error = %e, "failed to decode subscription document");
            None
        }
    }
}

#[async_trait]
impl SubscriptionStore for MongoSubscriptionStore {
    async fn list_active(&self) -> Result<Vec<Subscription>, SubscriptionStoreError> {
        let filter = doc! { "ref_count": { "$gt": 0 } };
        let mut cursor = self
            .collection
            .find(filter)
            .await
            .map_err(|e| SubscriptionStoreError::Transport(e.to_string()))?;

        let mut subs = Vec::new();
        loop {
            use futures_util::TryStreamExt;
            match cursor
                .try_next()
                .await
                .map_err(|e| SubscriptionStoreError::Transport(e.to_string()))?
            {
                Some(doc) => {
                    if let Some(sub) = to_subscription(doc) {
                        subs.push(sub);
                    }
                }
                None => break,
            }
        }

        debug!(count = subs.len(), "fetched active subscriptions");
        Ok(subs)
    }

    async fn subscribe(
        &self,
        market_id: &str,
        overrides: SubscribeOverrides,
    ) -> Result<(), SubscriptionStoreError> {
        let now = BsonDateTime::now();
        let mut set_on_insert = doc! { "created_at": now, "market_id": market_id };
        if let Some(slug) = overrides.slug {
            set_on_insert.insert("slug", slug);
        }
        if let Some(threshold) = overrides.conviction_threshold {
            set_on_insert.insert("conviction_threshold", threshold);
        }
        if let Some(threshold_pct) = overrides.conviction_threshold_pct {
            set_on_insert.insert("conviction_threshold_pct", threshold_pct);
        }

        let update = doc! {
            "$inc": { "ref_count": 1 },
            "$setOnInsert": set_on_insert,
            "$set": { "updated_at": now },
        };

        self.collection
            .update_one(doc! { "market_id": market_id }, update)
            .upsert(true)
            .await
            .map_err(|e| SubscriptionStoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn unsubscribe(&self, market_id: &str) -> Result<(), SubscriptionStoreError> {
        let update = doc! {
            "$inc": { "ref_count": -1 },
            "$set": { "updated_at": BsonDateTime::now() },
        };
        self.collection
            .update_one(doc! { "market_id": market_id }, update)
            .await
            .map_err(|e| SubscriptionStoreError::Transport(e.to_string()))?;
        Ok(())
    }
}
