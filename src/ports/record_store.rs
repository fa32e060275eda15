//! Record store port (the storage collaborator).
//!
//! A schemaless CRUD backend: named collections of named-field records,
//! looked up by field or id and saved whole. Stores do no locking across
//! calls; two concurrent find-or-create sequences for the same key may both
//! create.

use async_trait::async_trait;

use crate::domain::foundation::{Collection, CollectionSchema, Record, RecordId};

/// Errors that can occur during record store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(Collection),

    #[error("Record {id} not found in {collection}")]
    RecordNotFound { collection: Collection, id: RecordId },

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a collection's schema.
    ///
    /// # Errors
    /// Returns `StoreError::CollectionNotFound` if the collection is absent.
    async fn find_collection(&self, collection: Collection)
        -> Result<CollectionSchema, StoreError>;

    /// First record whose `field` equals `value`, in insertion order.
    async fn find_first_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, StoreError>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError>;

    /// Insert a new record or replace a stored one, returning it with its id.
    ///
    /// # Errors
    /// Returns `StoreError::RecordNotFound` when a record carrying an id no
    /// longer exists.
    async fn save(&self, record: Record) -> Result<Record, StoreError>;
}
