//! EntityResolver - looks up local records by the ids Stripe knows them by.
//!
//! Every call is a fresh query; nothing is cached between deliveries.

use std::sync::Arc;

use crate::domain::billing::{
    customer_fields, price_fields, product_fields, reasons, subscription_fields, BillingError,
};
use crate::domain::foundation::{Collection, CollectionSchema, Record, RecordId, UserId};
use crate::ports::{RecordStore, StoreError};

/// Maps a store failure onto the billing taxonomy.
///
/// A missing collection is a deployment problem and keeps its own variant;
/// everything else is a persistence failure tagged with `reason`.
pub(crate) fn store_failure(
    error: StoreError,
    reason: &'static str,
    operation: &'static str,
    external_id: &str,
) -> BillingError {
    match error {
        StoreError::CollectionNotFound(collection) => BillingError::SchemaMissing(collection),
        other => BillingError::persistence(reason, operation, external_id, other),
    }
}

#[derive(Clone)]
pub struct EntityResolver {
    store: Arc<dyn RecordStore>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Schema of `collection`, or `SchemaMissing` when it does not exist.
    pub async fn schema(&self, collection: Collection) -> Result<CollectionSchema, BillingError> {
        self.store.find_collection(collection).await.map_err(|e| {
            tracing::error!(collection = %collection, error = %e, "Collection lookup failed");
            store_failure(e, reasons::LOOKUP_FAILED, "find collection", collection.name())
        })
    }

    /// First record in `collection` whose `field` equals `value`.
    pub async fn find_first(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, BillingError> {
        self.store
            .find_first_by_field(collection, field, value)
            .await
            .map_err(|e| {
                tracing::error!(
                    collection = %collection,
                    field,
                    external_id = value,
                    error = %e,
                    "Record lookup failed"
                );
                store_failure(e, reasons::LOOKUP_FAILED, "lookup", value)
            })
    }

    pub async fn customer_by_user(&self, user_id: &UserId) -> Result<Option<Record>, BillingError> {
        self.find_first(Collection::Customer, customer_fields::USER_ID, user_id.as_str())
            .await
    }

    pub async fn customer_by_stripe_id(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<Record>, BillingError> {
        self.find_first(
            Collection::Customer,
            customer_fields::STRIPE_CUSTOMER_ID,
            stripe_customer_id,
        )
        .await
    }

    pub async fn product_by_stripe_id(&self, product_id: &str) -> Result<Option<Record>, BillingError> {
        self.find_first(Collection::Product, product_fields::PRODUCT_ID, product_id)
            .await
    }

    pub async fn price_by_stripe_id(&self, price_id: &str) -> Result<Option<Record>, BillingError> {
        self.find_first(Collection::Price, price_fields::PRICE_ID, price_id)
            .await
    }

    pub async fn subscription_by_stripe_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Record>, BillingError> {
        self.find_first(
            Collection::Subscription,
            subscription_fields::SUBSCRIPTION_ID,
            subscription_id,
        )
        .await
    }

    /// The user record whose record id is the local user id.
    pub async fn user_by_id(&self, user_id: &UserId) -> Result<Option<Record>, BillingError> {
        let id = RecordId::new(user_id.as_str())
            .map_err(|_| BillingError::Validation(reasons::UNKNOWN_CUSTOMER))?;
        self.store
            .find_by_id(Collection::Users, &id)
            .await
            .map_err(|e| store_failure(e, reasons::LOOKUP_FAILED, "find user", user_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryRecordStore;

    fn customer(user_id: &str, stripe_id: &str) -> Record {
        let mut record = Record::new(Collection::Customer);
        record.set(customer_fields::USER_ID, user_id);
        record.set(customer_fields::STRIPE_CUSTOMER_ID, stripe_id);
        record
    }

    async fn resolver_with(records: Vec<Record>) -> (EntityResolver, InMemoryRecordStore) {
        let store = InMemoryRecordStore::with_all_collections();
        for record in records {
            store.save(record).await.unwrap();
        }
        (EntityResolver::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn resolves_customer_both_ways() {
        let (resolver, _) = resolver_with(vec![customer("u1", "cus_1")]).await;

        let by_user = resolver
            .customer_by_user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap();
        let by_stripe = resolver.customer_by_stripe_id("cus_1").await.unwrap().unwrap();

        assert_eq!(by_user.id(), by_stripe.id());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (resolver, _) = resolver_with(vec![]).await;

        assert!(resolver.price_by_stripe_id("price_x").await.unwrap().is_none());
        assert!(resolver.product_by_stripe_id("prod_x").await.unwrap().is_none());
        assert!(resolver
            .subscription_by_stripe_id("sub_x")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn first_match_wins_on_duplicates() {
        let (resolver, store) =
            resolver_with(vec![customer("u1", "cus_dup"), customer("u2", "cus_dup")]).await;

        let found = resolver.customer_by_stripe_id("cus_dup").await.unwrap().unwrap();

        assert_eq!(found.get_str(customer_fields::USER_ID), Some("u1"));
        assert_eq!(store.count(Collection::Customer).await, 2);
    }

    #[tokio::test]
    async fn missing_collection_maps_to_schema_missing() {
        let store = InMemoryRecordStore::new();
        let resolver = EntityResolver::new(Arc::new(store));

        let lookup = resolver.customer_by_stripe_id("cus_1").await;
        let schema = resolver.schema(Collection::Product).await;

        assert_eq!(lookup, Err(BillingError::SchemaMissing(Collection::Customer)));
        assert_eq!(schema, Err(BillingError::SchemaMissing(Collection::Product)));
    }

    #[tokio::test]
    async fn user_lookup_uses_record_id() {
        let store = InMemoryRecordStore::with_all_collections();
        let user = Record::from_parts(
            RecordId::new("u1").unwrap(),
            Collection::Users,
            Default::default(),
        );
        // Seed directly; save() refuses unknown ids.
        store.seed(user).await;
        let resolver = EntityResolver::new(Arc::new(store));

        let found = resolver.user_by_id(&UserId::new("u1").unwrap()).await.unwrap();
        let missing = resolver.user_by_id(&UserId::new("u2").unwrap()).await.unwrap();

        assert!(found.is_some());
        assert!(missing.is_none());
    }

    #[test]
    fn store_failure_keeps_schema_missing_distinct() {
        let missing = store_failure(
            StoreError::CollectionNotFound(Collection::Price),
            reasons::PRICE_SAVE_FAILED,
            "upsert price",
            "price_1",
        );
        let db = store_failure(
            StoreError::Database("timeout".into()),
            reasons::PRICE_SAVE_FAILED,
            "upsert price",
            "price_1",
        );

        assert_eq!(missing, BillingError::SchemaMissing(Collection::Price));
        assert_eq!(db.failure_reason(), reasons::PRICE_SAVE_FAILED);
    }
}
