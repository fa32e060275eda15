//! Axum router for the billing endpoints.

use axum::{routing::post, Router};

use super::handlers::{
    create_checkout_session, create_portal_link, handle_stripe_webhook, BillingAppState,
};

/// Create the billing router.
///
/// # Routes
///
/// ## User endpoints (token in `Authorization`)
/// - `POST /create-checkout-session` - Start a hosted checkout for one price
/// - `POST /create-portal-link` - Open the billing portal
///
/// ## Webhook endpoints (no auth, signature verified)
/// - `POST /stripe` - Receive Stripe events
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/create-portal-link", post(create_portal_link))
        .route("/stripe", post(handle_stripe_webhook))
}

/// Billing router with its state applied, ready to merge or serve.
pub fn billing_router(state: BillingAppState) -> Router {
    billing_routes().with_state(state)
}
