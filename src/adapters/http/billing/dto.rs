//! HTTP DTOs for the billing endpoints.
//!
//! The checkout body is validated field by field so each problem gets its
//! own failure reason; serde's derive would collapse them into one.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::billing::{reasons, BillingError, PriceType};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /create-checkout-session`:
/// `{"price": {"id": "...", "type": "one_time|recurring"}, "quantity": N}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub price_type: PriceType,
    pub quantity: u64,
}

impl CheckoutRequest {
    /// Validates in order: JSON object, price, quantity, price type, price id.
    pub fn parse(body: &[u8]) -> Result<Self, BillingError> {
        let data: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|_| BillingError::ClientInput(reasons::UNPARSABLE_BODY))?;

        let price = data
            .get("price")
            .and_then(Value::as_object)
            .ok_or(BillingError::ClientInput(reasons::INVALID_PRICE_DATA))?;

        let quantity = data
            .get("quantity")
            .and_then(whole_quantity)
            .ok_or(BillingError::ClientInput(reasons::INVALID_QUANTITY))?;

        let price_type = price
            .get("type")
            .and_then(Value::as_str)
            .and_then(PriceType::parse)
            .ok_or(BillingError::ClientInput(reasons::INVALID_PRICE_TYPE))?;

        let price_id = price
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(BillingError::ClientInput(reasons::INVALID_PRICE_ID))?;

        Ok(Self {
            price_id: price_id.to_string(),
            price_type,
            quantity,
        })
    }
}

/// A JSON number that is a non-negative whole value (`2` or `2.0`).
/// Strings are never coerced.
fn whole_quantity(value: &Value) -> Option<u64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_u64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// `{"failure": "<reason>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureResponse {
    pub failure: String,
}

/// `{"success": "data was received"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub success: &'static str,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self {
            success: reasons::DATA_RECEIVED,
        }
    }
}
