//! MongoDB client and collection wrapper
//!
//! Typed collections apply their schema-declared indexes on first open and
//! stamp created/updated timestamps on insert. There is no soft-delete
//! layer: task deletion is a hard delete by contract.

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::StreamExt;
use mongodb::{
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateModifications},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::error::HomefrontError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with created/updated timestamps
pub trait Timestamped {
    fn stamp_created(&mut self, now: DateTime);
    fn stamp_updated(&mut self, now: DateTime);
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, HomefrontError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| HomefrontError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| HomefrontError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, HomefrontError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Timestamped,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Timestamped,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, HomefrontError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), HomefrontError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| HomefrontError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, HomefrontError> {
        let now = DateTime::now();
        item.stamp_created(now);
        item.stamp_updated(now);

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| HomefrontError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| HomefrontError::Database("Failed to get inserted ID".into()))
    }

    /// Insert many documents, stamping timestamps
    pub async fn insert_many(&self, items: Vec<T>) -> Result<usize, HomefrontError> {
        let now = DateTime::now();
        let stamped: Vec<T> = items
            .into_iter()
            .map(|mut item| {
                item.stamp_created(now);
                item.stamp_updated(now);
                item
            })
            .collect();

        let result = self
            .inner
            .insert_many(stamped)
            .await
            .map_err(|e| HomefrontError::Database(format!("Insert failed: {}", e)))?;

        Ok(result.inserted_ids.len())
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, HomefrontError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| HomefrontError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, HomefrontError> {
        self.find_many_with(filter, None).await
    }

    /// Find many documents by filter with a sort order
    pub async fn find_many_sorted(
        &self,
        filter: Document,
        sort: Document,
    ) -> Result<Vec<T>, HomefrontError> {
        self.find_many_with(filter, Some(sort)).await
    }

    async fn find_many_with(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, HomefrontError> {
        let options = FindOptions::builder().sort(sort).build();

        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| HomefrontError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, HomefrontError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| HomefrontError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, HomefrontError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| HomefrontError::Database(format!("Update failed: {}", e)))
    }

    /// Update every document matching a filter
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, HomefrontError> {
        self.inner
            .update_many(filter, update)
            .await
            .map_err(|e| HomefrontError::Database(format!("Update failed: {}", e)))
    }

    /// Upsert one document and return the post-update state
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<T>, HomefrontError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.inner
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
            .map_err(|e| HomefrontError::Database(format!("Upsert failed: {}", e)))
    }

    /// Hard-delete one document; succeeds even when nothing matches
    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, HomefrontError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| HomefrontError::Database(format!("Delete failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance.
    // Domain logic over fetched documents is tested in crate::engine.
}
