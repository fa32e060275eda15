//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresRecordStore` - Records kept as JSONB rows, one table for all
//!   collections

mod record_store;

pub use record_store::PostgresRecordStore;
