//! Billing handlers.
//!
//! ## Commands
//! - Creating checkout sessions for a price
//! - Creating billing portal links
//! - Processing Stripe webhooks
//!
//! ## Building blocks
//! - `EntityResolver` - record lookups by Stripe id
//! - `UpsertEngine` - find-or-create reconciliation per entity kind
//! - `CustomerProvisioner` - lazy user to Stripe customer mapping

mod create_checkout_session;
mod create_portal_link;
mod customer_provisioner;
mod entity_resolver;
mod handle_stripe_webhook;
mod session_context;
mod upsert_engine;

pub use create_checkout_session::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
};
pub use create_portal_link::{CreatePortalLinkCommand, CreatePortalLinkHandler};
pub use customer_provisioner::{CustomerProvisioner, ProvisionedCustomer};
pub use entity_resolver::EntityResolver;
pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
pub use session_context::SessionUrls;
pub use upsert_engine::{UpsertAction, UpsertEngine, UpsertOutcome};
