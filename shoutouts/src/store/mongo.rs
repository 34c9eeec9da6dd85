//! MongoDB-backed store
//!
//! Documents are converted by hand between [`Shoutout`] and BSON so that
//! `_id` stays a native ObjectId in the collection while clients see hex.

use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::Collection;
use serde_json::Map;

use super::ShoutoutStore;
use crate::database::MongoProvider;
use crate::error::{DatabaseError, DatabaseOperation, Result};
use crate::model::{RecipientCount, Shoutout, ShoutoutId};
use crate::query::ShoutoutFilter;

/// Store over one MongoDB collection
pub struct MongoShoutoutStore {
    provider: Arc<MongoProvider>,
    collection: String,
}

impl MongoShoutoutStore {
    /// Use the collection named in the provider's configuration
    pub fn new(provider: Arc<MongoProvider>) -> Self {
        let collection = provider.config().collection.clone();
        Self {
            provider,
            collection,
        }
    }

    async fn collection(&self) -> Result<Collection<Document>> {
        let database = self.provider.database().await?;
        Ok(database.collection::<Document>(&self.collection))
    }
}

impl ShoutoutStore for MongoShoutoutStore {
    async fn find(&self, filter: &ShoutoutFilter) -> Result<Vec<Shoutout>> {
        let op = DatabaseOperation::Find;
        let cursor = self
            .collection()
            .await?
            .find(filter.to_document())
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        documents
            .into_iter()
            .map(|d| from_document(op, d))
            .collect()
    }

    async fn find_by_id(&self, id: &ShoutoutId) -> Result<Option<Shoutout>> {
        let op = DatabaseOperation::FindOne;
        let found = self
            .collection()
            .await?
            .find_one(id_filter(id))
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        found.map(|d| from_document(op, d)).transpose()
    }

    async fn top_recipients(&self, limit: i64) -> Result<Vec<RecipientCount>> {
        let op = DatabaseOperation::Aggregate;
        let cursor = self
            .collection()
            .await?
            .aggregate(top_recipients_pipeline(limit))
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        documents
            .iter()
            .map(recipient_count_from_document)
            .collect()
    }

    async fn insert(&self, shoutout: &Shoutout) -> Result<ShoutoutId> {
        let op = DatabaseOperation::Insert;
        let id = ShoutoutId::new();

        let mut document = to_document(op, shoutout)?;
        document.insert("_id", id.object_id());

        self.collection()
            .await?
            .insert_one(document)
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        tracing::debug!(%id, "Inserted shoutout");
        Ok(id)
    }

    async fn delete(&self, id: &ShoutoutId) -> Result<bool> {
        let result = self
            .collection()
            .await?
            .delete_one(id_filter(id))
            .await
            .map_err(|e| DatabaseError::from_driver(DatabaseOperation::Delete, &e))?;

        Ok(result.deleted_count > 0)
    }

    async fn replace(&self, id: &ShoutoutId, shoutout: &Shoutout) -> Result<bool> {
        let op = DatabaseOperation::Replace;
        let replacement = to_document(op, shoutout)?;

        let result = self
            .collection()
            .await?
            .replace_one(id_filter(id), replacement)
            .await
            .map_err(|e| DatabaseError::from_driver(op, &e))?;

        // Existence decides 200 vs 404, so an unchanged replacement still counts
        Ok(result.matched_count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.provider
            .database()
            .await?
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DatabaseError::from_driver(DatabaseOperation::Ping, &e))?;
        Ok(())
    }
}

fn id_filter(id: &ShoutoutId) -> Document {
    doc! { "_id": id.object_id() }
}

/// Aggregation ranking recipients by received shoutouts
///
/// Records without `to` share one group whose `_id` is null.
pub fn top_recipients_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$to", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": limit },
        doc! { "$project": { "count": 1 } },
    ]
}

/// Convert a record to BSON without its identifier
fn to_document(op: DatabaseOperation, shoutout: &Shoutout) -> Result<Document> {
    let mut document = Document::new();

    if let Some(to) = &shoutout.to {
        document.insert("to", to.as_str());
    }
    if let Some(from) = &shoutout.from {
        document.insert("from", from.as_str());
    }
    for (key, value) in &shoutout.extra {
        let bson = bson::to_bson(value).map_err(|e| {
            DatabaseError::type_conversion(op, format!("field '{}': {}", key, e))
        })?;
        document.insert(key.as_str(), bson);
    }

    Ok(document)
}

/// Convert a stored document back to a record
fn from_document(op: DatabaseOperation, document: Document) -> Result<Shoutout> {
    let mut shoutout = Shoutout::default();
    let mut extra = Map::new();

    for (key, value) in document {
        match key.as_str() {
            "_id" => match value {
                Bson::ObjectId(oid) => shoutout.id = Some(ShoutoutId::from(oid)),
                other => {
                    return Err(DatabaseError::type_conversion(
                        op,
                        format!("_id is not an ObjectId: {}", other),
                    )
                    .into())
                }
            },
            "to" => shoutout.to = optional_string(op, "to", value)?,
            "from" => shoutout.from = optional_string(op, "from", value)?,
            _ => {
                extra.insert(key, value.into_relaxed_extjson());
            }
        }
    }

    if shoutout.id.is_none() {
        return Err(DatabaseError::type_conversion(op, "document has no _id").into());
    }

    shoutout.extra = extra;
    Ok(shoutout)
}

fn optional_string(op: DatabaseOperation, field: &str, value: Bson) -> Result<Option<String>> {
    match value {
        Bson::String(s) => Ok(Some(s)),
        Bson::Null => Ok(None),
        other => Err(DatabaseError::type_conversion(
            op,
            format!("'{}' is not a string: {}", field, other),
        )
        .into()),
    }
}

fn recipient_count_from_document(document: &Document) -> Result<RecipientCount> {
    let op = DatabaseOperation::Aggregate;

    let recipient = match document.get("_id") {
        Some(Bson::String(s)) => Some(s.clone()),
        Some(Bson::Null) | None => None,
        Some(other) => {
            return Err(DatabaseError::type_conversion(
                op,
                format!("group key is not a string: {}", other),
            )
            .into())
        }
    };

    let count = match document.get("count") {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        other => {
            return Err(DatabaseError::type_conversion(
                op,
                format!("count is not a number: {:?}", other),
            )
            .into())
        }
    };

    Ok(RecipientCount { recipient, count })
}
