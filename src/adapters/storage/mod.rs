//! Storage Adapters
//!
//! In-process implementation of the `RecordStore` port.
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::InMemoryRecordStore;
//!
//! let store = InMemoryRecordStore::with_all_collections();
//! ```

mod in_memory_record_store;

pub use in_memory_record_store::InMemoryRecordStore;
