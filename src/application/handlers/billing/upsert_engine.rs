//! UpsertEngine - reconciles Stripe payloads into local records.
//!
//! Every entity is upserted by its Stripe id: the first record carrying that
//! id is updated in place, otherwise a new record is created. Payload checks
//! and cross-reference resolution happen before anything is written.

use std::sync::Arc;

use crate::domain::billing::{
    reasons, BillingError, BillingProfileUpdate, CheckoutMode, CustomerMapping, Expandable,
    PriceFields, ProductFields, StripeCheckoutSession, StripePaymentMethod, StripePrice,
    StripeProduct, StripeSubscription, SubscriptionFields,
};
use crate::domain::foundation::{Collection, Record, UserId};
use crate::ports::RecordStore;

use super::entity_resolver::{store_failure, EntityResolver};

/// Whether an upsert created a record or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Saved record plus what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub record: Record,
}

pub struct UpsertEngine {
    store: Arc<dyn RecordStore>,
    resolver: EntityResolver,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let resolver = EntityResolver::new(store.clone());
        Self { store, resolver }
    }

    pub async fn upsert_product(
        &self,
        product: &StripeProduct,
    ) -> Result<UpsertOutcome, BillingError> {
        let fields = ProductFields::from_stripe(product);
        let existing = self.resolver.product_by_stripe_id(&product.id).await?;
        let mut record = self.existing_or_new(Collection::Product, existing).await?;
        fields.apply_to(&mut record);

        self.save(record, reasons::PRODUCT_SAVE_FAILED, "upsert product", &product.id)
            .await
    }

    pub async fn upsert_price(&self, price: &StripePrice) -> Result<UpsertOutcome, BillingError> {
        let fields = PriceFields::from_stripe(price);
        let existing = self.resolver.price_by_stripe_id(&price.id).await?;
        let mut record = self.existing_or_new(Collection::Price, existing).await?;
        fields.apply_to(&mut record);

        self.save(record, reasons::PRICE_SAVE_FAILED, "upsert price", &price.id)
            .await
    }

    /// Upserts a subscription owned by the user mapped to its customer.
    ///
    /// With `update_profile`, the subscription's default payment method is
    /// also copied onto that user.
    ///
    /// # Errors
    ///
    /// - `Validation` when the customer reference or a priced item is missing,
    ///   or the customer has no local mapping; nothing is written then
    /// - `SchemaMissing` when a collection it touches does not exist
    pub async fn upsert_subscription(
        &self,
        subscription: &StripeSubscription,
        update_profile: bool,
    ) -> Result<UpsertOutcome, BillingError> {
        let customer_id = subscription
            .customer
            .as_ref()
            .map(Expandable::id)
            .ok_or(BillingError::Validation(reasons::MISSING_SUBSCRIPTION_CUSTOMER))?;

        let (item, price) = subscription
            .first_item()
            .and_then(|item| item.price.as_ref().map(|price| (item, price)))
            .ok_or(BillingError::Validation(reasons::SUBSCRIPTION_WITHOUT_ITEMS))?;

        let mapping = self.resolve_mapping(customer_id).await?;

        let fields = SubscriptionFields::build(subscription, item, &price.id, mapping.user_id.clone())
            .map_err(|e| {
                tracing::warn!(
                    external_id = %subscription.id,
                    error = %e,
                    "Subscription timestamps out of range"
                );
                BillingError::Validation(reasons::UNPARSABLE_EVENT)
            })?;

        let schema = self.resolver.schema(Collection::Subscription).await?;
        let mut record = self
            .resolver
            .subscription_by_stripe_id(&subscription.id)
            .await?
            .unwrap_or_else(|| schema.new_record());
        fields.apply_to(&mut record);

        let outcome = self
            .save(
                record,
                reasons::SUBSCRIPTION_SAVE_FAILED,
                "upsert subscription",
                &subscription.id,
            )
            .await?;

        if update_profile {
            if let Some(method) = subscription
                .default_payment_method
                .as_ref()
                .and_then(Expandable::as_object)
            {
                self.update_billing_profile(&mapping.user_id, method).await?;
            }
        }

        Ok(outcome)
    }

    /// Applies a completed checkout.
    ///
    /// Subscription checkouts re-run the subscription upsert with the profile
    /// side effect. Other modes are accepted without local changes and yield
    /// `None`.
    pub async fn complete_checkout(
        &self,
        session: &StripeCheckoutSession,
    ) -> Result<Option<UpsertOutcome>, BillingError> {
        if session.mode != CheckoutMode::Subscription {
            tracing::info!(
                session_id = %session.id,
                mode = %session.mode,
                "Checkout completed without subscription; nothing to reconcile"
            );
            return Ok(None);
        }

        let subscription_ref = session
            .subscription
            .as_ref()
            .ok_or(BillingError::Validation(reasons::MISSING_CHECKOUT_SUBSCRIPTION))?;

        // An unexpanded subscription carries no customer to map.
        let subscription = subscription_ref
            .as_object()
            .filter(|sub| sub.customer.is_some())
            .ok_or(BillingError::Validation(reasons::MISSING_CHECKOUT_CUSTOMER))?;

        self.upsert_subscription(subscription, true).await.map(Some)
    }

    /// Copies payment method details onto the user record.
    ///
    /// A user that cannot be found is skipped; the subscription itself has
    /// already been saved.
    async fn update_billing_profile(
        &self,
        user_id: &UserId,
        method: &StripePaymentMethod,
    ) -> Result<(), BillingError> {
        let mut user = match self.resolver.user_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::info!(user_id = %user_id, "No user record; billing profile not updated");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "User lookup failed; billing profile not updated");
                return Ok(());
            }
        };

        BillingProfileUpdate::from_payment_method(method).apply_to(&mut user);
        self.store.save(user).await.map_err(|e| {
            tracing::error!(
                operation = "update billing profile",
                user_id = %user_id,
                error = %e,
                "Could not save user record"
            );
            store_failure(e, reasons::USER_SAVE_FAILED, "update billing profile", user_id.as_str())
        })?;

        tracing::info!(user_id = %user_id, payment_method = %method.method_type, "Billing profile updated");
        Ok(())
    }

    async fn resolve_mapping(&self, stripe_customer_id: &str) -> Result<CustomerMapping, BillingError> {
        let record = self
            .resolver
            .customer_by_stripe_id(stripe_customer_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    customer_id = stripe_customer_id,
                    "No customer mapping for subscription"
                );
                BillingError::Validation(reasons::UNKNOWN_CUSTOMER)
            })?;

        CustomerMapping::from_record(&record).map_err(|e| {
            tracing::warn!(
                customer_id = stripe_customer_id,
                error = %e,
                "Customer mapping record is incomplete"
            );
            BillingError::Validation(reasons::UNKNOWN_CUSTOMER)
        })
    }

    async fn existing_or_new(
        &self,
        collection: Collection,
        existing: Option<Record>,
    ) -> Result<Record, BillingError> {
        match existing {
            Some(record) => Ok(record),
            None => Ok(self.resolver.schema(collection).await?.new_record()),
        }
    }

    async fn save(
        &self,
        record: Record,
        reason: &'static str,
        operation: &'static str,
        external_id: &str,
    ) -> Result<UpsertOutcome, BillingError> {
        let action = if record.is_new() {
            UpsertAction::Created
        } else {
            UpsertAction::Updated
        };
        let collection = record.collection();

        let record = self.store.save(record).await.map_err(|e| {
            tracing::error!(operation, external_id, error = %e, "Could not save record");
            store_failure(e, reason, operation, external_id)
        })?;

        tracing::info!(
            collection = %collection,
            external_id,
            action = ?action,
            "Record upserted"
        );
        Ok(UpsertOutcome { action, record })
    }
}
