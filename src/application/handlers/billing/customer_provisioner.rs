//! CustomerProvisioner - finds or lazily creates a user's Stripe customer.
//!
//! Creation is two steps that cannot share a transaction: the remote
//! customer is created first, then the local mapping is saved. The remote
//! call carries an idempotency key derived from the user id, so when the
//! local save fails the next attempt gets the same remote customer back
//! instead of minting another one.

use std::sync::Arc;

use crate::domain::billing::{reasons, BillingError, CustomerMapping};
use crate::domain::foundation::{AuthenticatedUser, Collection};
use crate::ports::{CreateCustomerRequest, PaymentProvider, RecordStore};

use super::entity_resolver::{store_failure, EntityResolver};

/// Result of resolving a user's customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedCustomer {
    pub mapping: CustomerMapping,
    /// True when the mapping was created by this call.
    pub created: bool,
}

#[derive(Clone)]
pub struct CustomerProvisioner {
    store: Arc<dyn RecordStore>,
    resolver: EntityResolver,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CustomerProvisioner {
    pub fn new(store: Arc<dyn RecordStore>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        let resolver = EntityResolver::new(store.clone());
        Self {
            store,
            resolver,
            payment_provider,
        }
    }

    /// Returns the user's customer mapping, creating it on first use.
    pub async fn resolve_or_create(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<ProvisionedCustomer, BillingError> {
        let mut incomplete = None;
        if let Some(record) = self.resolver.customer_by_user(&user.id).await? {
            match CustomerMapping::from_record(&record) {
                Ok(mapping) => {
                    return Ok(ProvisionedCustomer {
                        mapping,
                        created: false,
                    })
                }
                // A mapping without a Stripe id is provisioned again and
                // completed in place, keeping one row per user.
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Completing incomplete customer mapping");
                    incomplete = Some(record);
                }
            }
        }

        // Fail before the remote call if the mapping could not be stored.
        let schema = self.resolver.schema(Collection::Customer).await?;

        let customer = self
            .payment_provider
            .create_customer(CreateCustomerRequest::for_user(
                user.id.clone(),
                user.email.clone(),
            ))
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Stripe customer creation failed");
                BillingError::remote(reasons::CUSTOMER_CREATE_FAILED, e)
            })?;

        let mapping = CustomerMapping::new(user.id.clone(), customer.id);
        let mut record = incomplete.unwrap_or_else(|| schema.new_record());
        mapping.apply_to(&mut record);

        self.store.save(record).await.map_err(|e| {
            tracing::error!(
                operation = "create customer mapping",
                user_id = %user.id,
                customer_id = %mapping.stripe_customer_id,
                error = %e,
                "Stripe customer has no local mapping; a retry reuses it"
            );
            store_failure(
                e,
                reasons::CUSTOMER_SAVE_FAILED,
                "create customer mapping",
                &mapping.stripe_customer_id,
            )
        })?;

        tracing::info!(
            user_id = %user.id,
            customer_id = %mapping.stripe_customer_id,
            "Customer mapping created"
        );
        Ok(ProvisionedCustomer {
            mapping,
            created: true,
        })
    }
}
