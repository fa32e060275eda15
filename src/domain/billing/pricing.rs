//! Price types and checkout modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing scheme of a Stripe price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    OneTime,
    Recurring,
}

impl PriceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_time" => Some(PriceType::OneTime),
            "recurring" => Some(PriceType::Recurring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::OneTime => "one_time",
            PriceType::Recurring => "recurring",
        }
    }

    /// Checkout mode that sells a price of this type.
    pub fn checkout_mode(&self) -> CheckoutMode {
        match self {
            PriceType::OneTime => CheckoutMode::Payment,
            PriceType::Recurring => CheckoutMode::Subscription,
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode of a Stripe checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    Payment,
    Setup,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Setup => "setup",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

impl fmt::Display for CheckoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
