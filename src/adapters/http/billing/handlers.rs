//! HTTP handlers for the billing endpoints.
//!
//! These handlers connect Axum routes to the billing command handlers. Every
//! failure is answered as `{"failure": "<reason>"}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::billing::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreatePortalLinkCommand,
    CreatePortalLinkHandler, CustomerProvisioner, HandleStripeWebhookCommand,
    HandleStripeWebhookHandler, SessionUrls, UpsertEngine,
};
use crate::domain::billing::{reasons, BillingError};
use crate::ports::{PaymentProvider, RecordStore, SessionValidator};

use super::dto::{CheckoutRequest, FailureResponse, WebhookAck};

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing routes.
///
/// Cloned per request; handlers are assembled on demand from these parts.
#[derive(Clone)]
pub struct BillingAppState {
    pub record_store: Arc<dyn RecordStore>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub urls: SessionUrls,
}

impl BillingAppState {
    fn provisioner(&self) -> CustomerProvisioner {
        CustomerProvisioner::new(self.record_store.clone(), self.payment_provider.clone())
    }

    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.session_validator.clone(),
            self.provisioner(),
            self.payment_provider.clone(),
            self.urls.clone(),
        )
    }

    pub fn portal_handler(&self) -> CreatePortalLinkHandler {
        CreatePortalLinkHandler::new(
            self.session_validator.clone(),
            self.provisioner(),
            self.payment_provider.clone(),
            self.urls.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(
            self.payment_provider.clone(),
            UpsertEngine::new(self.record_store.clone()),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /create-checkout-session
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let body = read_body(body)?;
    let request = CheckoutRequest::parse(&body)?;

    let cmd = CreateCheckoutSessionCommand {
        token: auth_token(&headers),
        price_id: request.price_id,
        price_type: request.price_type,
        quantity: request.quantity,
    };
    let result = state.checkout_handler().handle(cmd).await?;

    Ok(Json(result.session))
}

/// POST /create-portal-link
pub async fn create_portal_link(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CreatePortalLinkCommand {
        token: auth_token(&headers),
    };
    let session = state.portal_handler().handle(cmd).await?;

    Ok(Json(session))
}

/// POST /stripe
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let body = read_body(body)?;

    // A missing header verifies as an empty one and fails as malformed.
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };
    state.webhook_handler().handle(cmd).await?;

    Ok(Json(WebhookAck::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Helpers
// ════════════════════════════════════════════════════════════════════════════════

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, BillingError> {
    body.map_err(|e| {
        tracing::warn!(error = %e, "Could not read request body");
        BillingError::ClientInput(reasons::UNREADABLE_BODY)
    })
}

/// Token from `Authorization`, with or without a `Bearer ` prefix.
fn auth_token(headers: &HeaderMap) -> String {
    let raw = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim();
    raw.strip_prefix("Bearer ").unwrap_or(raw).trim().to_string()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Billing request failed");
        }
        let body = FailureResponse {
            failure: self.0.failure_reason(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use crate::domain::foundation::Collection;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn auth_token_accepts_raw_and_bearer() {
        assert_eq!(auth_token(&headers("abc")), "abc");
        assert_eq!(auth_token(&headers("Bearer abc")), "abc");
        assert_eq!(auth_token(&HeaderMap::new()), "");
    }

    #[test]
    fn error_response_maps_status() {
        let missing = BillingApiError(BillingError::SchemaMissing(Collection::Price)).into_response();
        let client = BillingApiError(BillingError::ClientInput(reasons::INVALID_QUANTITY)).into_response();

        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client.status(), StatusCode::BAD_REQUEST);
    }
}
