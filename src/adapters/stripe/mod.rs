//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API:
//! - Customer creation (idempotent per user)
//! - Checkout and billing portal sessions
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use api_types::{StripeApiError, StripeErrorResponse, USER_ID_METADATA_KEY};
pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
