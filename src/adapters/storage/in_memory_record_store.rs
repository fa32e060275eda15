//! In-Memory Record Store Adapter
//!
//! Keeps collections in memory in insertion order. Used by tests and local
//! development; nothing survives a restart.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{Collection, CollectionSchema, Record, RecordId};
use crate::ports::{RecordStore, StoreError};

/// In-memory storage for billing records
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Record>>>>,
    failing_saves: Arc<RwLock<HashSet<Collection>>>,
}

impl InMemoryRecordStore {
    /// Create a store with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with every billing collection present.
    pub fn with_all_collections() -> Self {
        let map: HashMap<Collection, Vec<Record>> = Collection::ALL
            .into_iter()
            .map(|c| (c, Vec::new()))
            .collect();
        Self {
            collections: Arc::new(RwLock::new(map)),
            failing_saves: Arc::default(),
        }
    }

    pub async fn create_collection(&self, collection: Collection) {
        self.collections.write().await.entry(collection).or_default();
    }

    pub async fn drop_collection(&self, collection: Collection) {
        self.collections.write().await.remove(&collection);
    }

    /// Make every later save into `collection` fail.
    pub async fn fail_saves_for(&self, collection: Collection) {
        self.failing_saves.write().await.insert(collection);
    }

    /// Insert a record that already carries an id, creating its collection
    /// if needed. Replaces any record with the same id.
    ///
    /// Stands in for rows written by other parts of the application, such
    /// as `users`.
    pub async fn seed(&self, record: Record) {
        let mut collections = self.collections.write().await;
        let records = collections.entry(record.collection()).or_default();
        match records
            .iter_mut()
            .find(|r| r.id().is_some() && r.id() == record.id())
        {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
    }

    /// Snapshot of a collection's records in insertion order.
    pub async fn records(&self, collection: Collection) -> Vec<Record> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_collection(
        &self,
        collection: Collection,
    ) -> Result<CollectionSchema, StoreError> {
        if self.collections.read().await.contains_key(&collection) {
            Ok(CollectionSchema::new(collection))
        } else {
            Err(StoreError::CollectionNotFound(collection))
        }
    }

    async fn find_first_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.read().await;
        let records = collections
            .get(&collection)
            .ok_or(StoreError::CollectionNotFound(collection))?;
        Ok(records
            .iter()
            .find(|r| r.get_str(field) == Some(value))
            .cloned())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.read().await;
        let records = collections
            .get(&collection)
            .ok_or(StoreError::CollectionNotFound(collection))?;
        Ok(records.iter().find(|r| r.id() == Some(id)).cloned())
    }

    async fn save(&self, mut record: Record) -> Result<Record, StoreError> {
        let collection = record.collection();
        if self.failing_saves.read().await.contains(&collection) {
            return Err(StoreError::Database(format!(
                "save into {} rejected",
                collection
            )));
        }

        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(&collection)
            .ok_or(StoreError::CollectionNotFound(collection))?;

        match record.id().cloned() {
            None => {
                record.assign_id(RecordId::generate());
                records.push(record.clone());
            }
            Some(id) => {
                let slot = records
                    .iter_mut()
                    .find(|r| r.id() == Some(&id))
                    .ok_or(StoreError::RecordNotFound { collection, id })?;
                *slot = record.clone();
            }
        }
        Ok(record)
    }
}
