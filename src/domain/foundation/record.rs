//! Schemaless record model shared with the storage collaborator.
//!
//! Billing entities are persisted as named-field records inside named
//! collections. The billing core builds field mappings onto a `Record`; the
//! store decides how those fields are laid out on disk.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::RecordId;

/// Collections the billing core reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Customer,
    Product,
    Price,
    Subscription,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Customer,
        Collection::Product,
        Collection::Price,
        Collection::Subscription,
        Collection::Users,
    ];

    /// Storage name of the collection.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Customer => "customer",
            Collection::Product => "product",
            Collection::Price => "price",
            Collection::Subscription => "subscription",
            Collection::Users => "users",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Proof that a collection exists in the store.
///
/// New records are only constructed through a schema, so a missing collection
/// surfaces before any field mapping is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    collection: Collection,
}

impl CollectionSchema {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Creates an empty, unsaved record in this collection.
    pub fn new_record(&self) -> Record {
        Record::new(self.collection)
    }
}

/// A named-field record. `id` is `None` until the store has saved it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Option<RecordId>,
    collection: Collection,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(collection: Collection) -> Self {
        Self {
            id: None,
            collection,
            fields: Map::new(),
        }
    }

    /// Rehydrates a stored record.
    pub fn from_parts(id: RecordId, collection: Collection, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id),
            collection,
            fields,
        }
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// True until the record has been saved once.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Called by stores when a new record is first persisted.
    pub fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}
