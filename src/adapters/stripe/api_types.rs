//! Stripe REST API wire types.
//!
//! Response bodies for successful calls decode straight into the port types;
//! this module covers the error envelope and the form encoding of requests.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::billing::CheckoutMode;
use crate::ports::{CreateCheckoutRequest, CreateCustomerRequest, PaymentError, PaymentErrorCode};

/// Metadata key carrying the local user id on Stripe customers.
pub const USER_ID_METADATA_KEY: &str = "user_id";

/// Body Stripe returns for non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StripeApiError {
    fn error_code(&self, status: StatusCode) -> PaymentErrorCode {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return PaymentErrorCode::RateLimitExceeded;
        }
        match self.error_type.as_str() {
            "authentication_error" => PaymentErrorCode::AuthenticationError,
            "invalid_request_error" => PaymentErrorCode::InvalidRequest,
            "rate_limit_error" => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        }
    }
}

/// Maps a failed Stripe response body to a `PaymentError`.
pub fn payment_error_from_response(status: StatusCode, body: &str) -> PaymentError {
    match serde_json::from_str::<StripeErrorResponse>(body) {
        Ok(parsed) => {
            let api_error = parsed.error;
            let message = api_error
                .message
                .clone()
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let mut error = PaymentError::new(api_error.error_code(status), message);
            if let Some(code) = api_error.code {
                error = error.with_provider_code(code);
            }
            error
        }
        Err(_) => PaymentError::provider(format!("Stripe API error ({}): {}", status, body)),
    }
}

/// Form fields for `POST /v1/customers`.
pub fn customer_form(request: &CreateCustomerRequest) -> Vec<(String, String)> {
    vec![
        ("email".into(), request.email.clone()),
        (
            format!("metadata[{}]", USER_ID_METADATA_KEY),
            request.user_id.to_string(),
        ),
    ]
}

/// Form fields for `POST /v1/checkout/sessions`.
pub fn checkout_form(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("customer".into(), request.customer_id.clone()),
        ("payment_method_types[0]".into(), "card".into()),
        ("mode".into(), request.mode.as_str().into()),
        ("line_items[0][price]".into(), request.price_id.clone()),
        ("line_items[0][quantity]".into(), request.quantity.to_string()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        (
            "allow_promotion_codes".into(),
            request.allow_promotion_codes.to_string(),
        ),
    ];

    if request.collect_billing_address {
        params.push(("billing_address_collection".into(), "required".into()));
        params.push(("customer_update[address]".into(), "auto".into()));
    }

    // An empty map encodes to nothing; Stripe then applies no metadata.
    if request.mode == CheckoutMode::Subscription {
        if let Some(metadata) = &request.subscription_metadata {
            for (key, value) in metadata {
                params.push((format!("subscription_data[metadata][{}]", key), value.clone()));
            }
        }
    }

    params
}
