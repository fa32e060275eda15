//! HTTP adapter for the billing endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CheckoutRequest, FailureResponse, WebhookAck};
pub use handlers::{BillingApiError, BillingAppState};
pub use routes::{billing_router, billing_routes};
