//! Mock payment provider for testing.
//!
//! Provides a configurable implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured sessions
//! - Error injection per method
//! - Call tracking
//! - Idempotent customer creation keyed on the idempotency key

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Map;

use crate::domain::billing::{StripeEvent, StripeWebhookVerifier, VerificationError};

use super::api_types::USER_ID_METADATA_KEY;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentProvider, PortalSession,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_method_error("create_customer", PaymentError::network("down"));
///
/// let result = mock.create_customer(request).await;
/// assert!(mock.was_called("create_customer"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers created so far, by idempotency key.
    customers_by_key: HashMap<String, Customer>,

    /// Number of customers minted; drives generated ids.
    minted: usize,

    next_checkout: Option<CheckoutSession>,
    next_portal: Option<PortalSession>,

    /// Error to return on the next call to any method.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,

    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// How to handle webhook verification.
#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Accept any payload that parses as an event.
    #[default]
    AcceptAll,

    /// Verify signatures against this signing secret.
    RequireSignature(String),

    /// Always fail verification.
    AlwaysFail,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that verifies webhook signatures with `secret`.
    pub fn with_webhook_secret(secret: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::RequireSignature(secret.into());
        mock
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the checkout session to return on the next call.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.state().next_checkout = Some(session);
    }

    /// Set the portal session to return on the next call.
    pub fn set_portal_session(&self, session: PortalSession) {
        self.state().next_portal = Some(session);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Distinct remote customers created so far.
    pub fn customers_created(&self) -> usize {
        self.state().minted
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    /// A test that panicked while holding the lock must not wedge the rest.
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Global error is consumed.
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone()],
        );
        self.check_error("create_customer")?;

        let mut state = self.state();
        if let Some(existing) = request
            .idempotency_key
            .as_ref()
            .and_then(|key| state.customers_by_key.get(key))
        {
            return Ok(existing.clone());
        }

        state.minted += 1;
        let customer = Customer {
            id: format!("cus_mock_{}", state.minted),
            email: Some(request.email),
            metadata: [(USER_ID_METADATA_KEY.to_string(), request.user_id.to_string())]
                .into_iter()
                .collect(),
        };
        if let Some(key) = request.idempotency_key {
            state.customers_by_key.insert(key, customer.clone());
        }
        Ok(customer)
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call(
            "create_checkout_session",
            vec![
                request.customer_id.clone(),
                request.price_id.clone(),
                request.quantity.to_string(),
                request.mode.as_str().to_string(),
            ],
        );
        self.check_error("create_checkout_session")?;

        let session = self.state().next_checkout.take();
        Ok(session.unwrap_or_else(|| CheckoutSession {
            id: "cs_test".to_string(),
            url: Some("https://checkout.stripe.com/c/pay/cs_test".to_string()),
            customer: Some(request.customer_id),
            extra: Map::new(),
        }))
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        self.record_call(
            "create_portal_session",
            vec![customer_id.to_string(), return_url.to_string()],
        );
        self.check_error("create_portal_session")?;

        let session = self.state().next_portal.take();
        Ok(session.unwrap_or_else(|| PortalSession {
            id: "bps_test".to_string(),
            url: "https://example.com/portal".to_string(),
            extra: Map::new(),
        }))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<StripeEvent, VerificationError> {
        self.record_call("verify_webhook", vec![signature.to_string()]);

        let mode = self.state().webhook_verify_mode.clone();
        match mode {
            WebhookVerifyMode::AcceptAll => serde_json::from_slice(payload)
                .map_err(|e| VerificationError::ParseError(e.to_string())),
            WebhookVerifyMode::RequireSignature(secret) => {
                StripeWebhookVerifier::new(secret).verify_and_parse(payload, signature)
            }
            WebhookVerifyMode::AlwaysFail => Err(VerificationError::InvalidSignature),
        }
    }
}
