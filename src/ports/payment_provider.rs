//! Payment provider port (the billing collaborator).
//!
//! The bridge never reimplements Stripe; it asks the provider for customers
//! and hosted sessions, and has it authenticate inbound webhook deliveries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::billing::{CheckoutMode, StripeEvent, VerificationError};
use crate::domain::foundation::UserId;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer in the payment system.
    ///
    /// Implementations must forward `idempotency_key` so that a repeated call
    /// for the same user yields the same remote customer.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, PaymentError>;

    /// Create a hosted checkout session for a single line item.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Create a billing portal session for subscription management.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError>;

    /// Authenticate a webhook delivery and parse its envelope.
    ///
    /// `payload` must be the raw request body, byte for byte.
    fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> Result<StripeEvent, VerificationError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Local user ID (stored as metadata).
    pub user_id: UserId,
    /// Customer email address.
    pub email: String,
    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

impl CreateCustomerRequest {
    /// Request keyed on the user, so retries reuse the first remote customer.
    pub fn for_user(user_id: UserId, email: impl Into<String>) -> Self {
        let idempotency_key = Some(format!("customer-{}", user_id));
        Self {
            user_id,
            email: email.into(),
            idempotency_key,
        }
    }
}

/// Customer in the payment system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer ID.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Request to create a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    pub customer_id: String,
    pub price_id: String,
    pub quantity: u64,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
    pub allow_promotion_codes: bool,
    /// Collect a billing address and save it back onto the customer.
    pub collect_billing_address: bool,
    /// Metadata copied onto the resulting subscription (subscription mode only).
    pub subscription_metadata: Option<BTreeMap<String, String>>,
}

/// Checkout session as returned by the provider.
///
/// Fields the bridge does not inspect are kept in `extra` and passed through
/// to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID.
    pub id: String,
    /// URL for customer to complete checkout.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Portal session for subscription management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSession {
    /// Provider's session ID.
    pub id: String,
    /// URL for customer to access portal.
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Provider's error code (if available).
    pub provider_code: Option<String>,
    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,
    /// API authentication failed.
    AuthenticationError,
    /// The provider rejected the request parameters.
    InvalidRequest,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Provider API error.
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
