//! Ports - Interfaces for external dependencies.
//!
//! The billing handlers depend only on these traits; adapters implement
//! them for Stripe, Postgres, session tokens and tests.
//!
//! - `PaymentProvider` - customer, checkout and portal calls plus webhook verification
//! - `RecordStore` - collection-scoped record persistence
//! - `SessionValidator` - resolves a session token to a user

mod payment_provider;
mod record_store;
mod session_validator;

pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, PortalSession,
};
pub use record_store::{RecordStore, StoreError};
pub use session_validator::SessionValidator;
