//! PostgreSQL implementation of RecordStore.
//!
//! Records live in one `records` table with their fields in a JSONB column;
//! `record_collections` lists the collections that exist.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{Collection, CollectionSchema, Record, RecordId};
use crate::ports::{RecordStore, StoreError};

const COLLECTION_FK: &str = "records_collection_fkey";

/// PostgreSQL implementation of the RecordStore port.
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a record.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: String,
    data: Json<Map<String, Value>>,
}

impl RecordRow {
    fn into_record(self, collection: Collection) -> Result<Record, StoreError> {
        let id = RecordId::new(self.id).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Record::from_parts(id, collection, self.data.0))
    }
}

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{}: {}", context, e))
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn find_collection(
        &self,
        collection: Collection,
    ) -> Result<CollectionSchema, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM record_collections WHERE name = $1)",
        )
        .bind(collection.name())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to look up collection", e))?;

        if exists {
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
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, data FROM records
            WHERE collection = $1 AND data ->> $2 = $3
            ORDER BY seq
            LIMIT 1
            "#,
        )
        .bind(collection.name())
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query records", e))?;

        row.map(|r| r.into_record(collection)).transpose()
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        let row: Option<RecordRow> =
            sqlx::query_as("SELECT id, data FROM records WHERE collection = $1 AND id = $2")
                .bind(collection.name())
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to load record", e))?;

        row.map(|r| r.into_record(collection)).transpose()
    }

    async fn save(&self, mut record: Record) -> Result<Record, StoreError> {
        let collection = record.collection();
        let data = Json(record.fields().clone());

        match record.id().cloned() {
            None => {
                let id = RecordId::generate();
                sqlx::query("INSERT INTO records (id, collection, data) VALUES ($1, $2, $3)")
                    .bind(id.as_str())
                    .bind(collection.name())
                    .bind(data)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        if let sqlx::Error::Database(db_err) = &e {
                            if db_err.constraint() == Some(COLLECTION_FK) {
                                return StoreError::CollectionNotFound(collection);
                            }
                        }
                        db_error("Failed to insert record", e)
                    })?;
                record.assign_id(id);
            }
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE records SET data = $3, updated_at = now()
                    WHERE id = $1 AND collection = $2
                    "#,
                )
                .bind(id.as_str())
                .bind(collection.name())
                .bind(data)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to update record", e))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::RecordNotFound { collection, id });
                }
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_maps_to_record_in_collection() {
        let mut data = Map::new();
        data.insert("price_id".into(), json!("price_1"));
        let row = RecordRow {
            id: "abc".into(),
            data: Json(data),
        };

        let record = row.into_record(Collection::Price).unwrap();

        assert_eq!(record.collection(), Collection::Price);
        assert_eq!(record.id().map(RecordId::as_str), Some("abc"));
        assert_eq!(record.get_str("price_id"), Some("price_1"));
    }

    #[test]
    fn row_with_empty_id_is_rejected() {
        let row = RecordRow {
            id: String::new(),
            data: Json(Map::new()),
        };

        assert!(matches!(
            row.into_record(Collection::Price),
            Err(StoreError::Serialization(_))
        ));
    }
}
