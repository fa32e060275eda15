//! HandleStripeWebhookHandler - verifies, classifies and applies a Stripe
//! webhook delivery.
//!
//! Nothing is read from or written to the store until the signature has been
//! verified. Redeliveries are safe: every write is an upsert keyed on the
//! Stripe id.

use std::sync::Arc;

use crate::domain::billing::{reasons, BillingError, BillingEvent};
use crate::ports::PaymentProvider;

use super::upsert_engine::{UpsertEngine, UpsertOutcome};

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, byte for byte.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header; empty when the header was absent.
    pub signature: String,
}

/// What a delivery changed locally.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleStripeWebhookResult {
    Product(UpsertOutcome),
    Price(UpsertOutcome),
    Subscription(UpsertOutcome),
    /// `None` for checkouts that need no local change.
    CheckoutCompleted(Option<UpsertOutcome>),
}

pub struct HandleStripeWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    engine: UpsertEngine,
}

impl HandleStripeWebhookHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, engine: UpsertEngine) -> Self {
        Self {
            payment_provider,
            engine,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<HandleStripeWebhookResult, BillingError> {
        // 1. Verify signature and parse the envelope
        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook verification failed");
                BillingError::Verification(e)
            })?;

        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Webhook received");

        // 2. Classify and decode the payload
        let classified = BillingEvent::from_event(&event).map_err(|e| {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Could not decode event payload"
            );
            BillingError::Validation(reasons::UNPARSABLE_EVENT)
        })?;

        // 3. Apply it
        let result = match classified {
            BillingEvent::Product(product) => {
                HandleStripeWebhookResult::Product(self.engine.upsert_product(&product).await?)
            }
            BillingEvent::Price(price) => {
                HandleStripeWebhookResult::Price(self.engine.upsert_price(&price).await?)
            }
            BillingEvent::Subscription {
                change,
                subscription,
            } => HandleStripeWebhookResult::Subscription(
                self.engine
                    .upsert_subscription(&subscription, change.updates_billing_profile())
                    .await?,
            ),
            BillingEvent::CheckoutCompletion(session) => {
                HandleStripeWebhookResult::CheckoutCompleted(
                    self.engine.complete_checkout(&session).await?,
                )
            }
            BillingEvent::Unhandled(event_type) => {
                tracing::info!(event_id = %event.id, event_type = %event_type, "Unhandled event type");
                return Err(BillingError::UnhandledEvent(event_type));
            }
        };

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Webhook processed");
        Ok(result)
    }
}
