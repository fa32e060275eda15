//! Error taxonomy for the billing bridge.
//!
//! Kinds stay distinct internally even where they share a wire status:
//! client input and verification failures are final, remote call and
//! persistence failures are worth a redelivery, a missing collection is a
//! deployment problem.

use axum::http::StatusCode;
use thiserror::Error;

use super::verification::VerificationError;
use crate::domain::foundation::Collection;

/// Stable failure reasons returned to callers.
pub mod reasons {
    pub const UNREADABLE_BODY: &str = "could not read request body";
    pub const UNPARSABLE_BODY: &str = "could not parse request body";
    pub const INVALID_PRICE_DATA: &str = "invalid price data";
    pub const INVALID_QUANTITY: &str = "invalid quantity";
    pub const INVALID_PRICE_TYPE: &str = "invalid price type";
    pub const INVALID_PRICE_ID: &str = "invalid price id";
    pub const UNKNOWN_AUTH_TOKEN: &str = "could not find auth record by token";
    pub const CUSTOMER_CREATE_FAILED: &str = "could not create Stripe customer";
    pub const CUSTOMER_SAVE_FAILED: &str = "could not create new customer";
    pub const SESSION_CREATE_FAILED: &str = "could not create new session";
    pub const VERIFICATION_FAILED: &str = "webhook verification failed";
    pub const UNPARSABLE_EVENT: &str = "failed to parse the stripe event";
    pub const MISSING_SUBSCRIPTION_CUSTOMER: &str = "missing subscription customer";
    pub const SUBSCRIPTION_WITHOUT_ITEMS: &str = "subscription has no items";
    pub const UNKNOWN_CUSTOMER: &str = "no customer";
    pub const MISSING_CHECKOUT_SUBSCRIPTION: &str = "missing checkout subscription";
    pub const MISSING_CHECKOUT_CUSTOMER: &str = "missing checkout customer";
    pub const PRODUCT_SAVE_FAILED: &str = "could not save product record";
    pub const PRICE_SAVE_FAILED: &str = "could not save price record";
    pub const SUBSCRIPTION_SAVE_FAILED: &str = "couldn't submit subscription update";
    pub const USER_SAVE_FAILED: &str = "couldn't submit user update";
    pub const LOOKUP_FAILED: &str = "could not query records";
    pub const UNHANDLED_EVENT: &str = "didn't receive a valid event";
    pub const DATA_RECEIVED: &str = "data was received";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Malformed or missing request input, or an unknown auth token.
    #[error("client input rejected: {0}")]
    ClientInput(&'static str),

    /// The webhook delivery could not be authenticated.
    #[error("webhook verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// A verified event whose type the bridge does not reconcile.
    #[error("unhandled event type: {0}")]
    UnhandledEvent(String),

    /// A verified payload that cannot be reconciled as sent.
    #[error("event rejected: {0}")]
    Validation(&'static str),

    /// A required local collection is absent.
    #[error("collection {0} does not exist")]
    SchemaMissing(Collection),

    /// The billing provider API failed.
    #[error("{reason}: {detail}")]
    RemoteCall { reason: &'static str, detail: String },

    /// A local lookup or save failed.
    #[error("{operation} failed for {external_id}: {detail}")]
    Persistence {
        reason: &'static str,
        operation: &'static str,
        external_id: String,
        detail: String,
    },
}

impl BillingError {
    pub fn remote(reason: &'static str, detail: impl ToString) -> Self {
        BillingError::RemoteCall {
            reason,
            detail: detail.to_string(),
        }
    }

    pub fn persistence(
        reason: &'static str,
        operation: &'static str,
        external_id: impl Into<String>,
        detail: impl ToString,
    ) -> Self {
        BillingError::Persistence {
            reason,
            operation,
            external_id: external_id.into(),
            detail: detail.to_string(),
        }
    }

    /// Short reason that is safe to show to the caller.
    pub fn failure_reason(&self) -> String {
        match self {
            BillingError::ClientInput(reason) | BillingError::Validation(reason) => {
                (*reason).to_string()
            }
            BillingError::Verification(_) => reasons::VERIFICATION_FAILED.to_string(),
            BillingError::UnhandledEvent(_) => reasons::UNHANDLED_EVENT.to_string(),
            BillingError::SchemaMissing(collection) => {
                format!("could not find collection {}", collection)
            }
            BillingError::RemoteCall { reason, .. } | BillingError::Persistence { reason, .. } => {
                (*reason).to_string()
            }
        }
    }

    /// Wire status. Only a missing collection is a 5xx; remote and storage
    /// failures reuse 400, which still makes Stripe redeliver.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::SchemaMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::ClientInput(_)
            | BillingError::Verification(_)
            | BillingError::UnhandledEvent(_)
            | BillingError::Validation(_)
            | BillingError::RemoteCall { .. }
            | BillingError::Persistence { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the same request may succeed later without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::RemoteCall { .. } | BillingError::Persistence { .. }
        )
    }
}
