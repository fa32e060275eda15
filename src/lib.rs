//! Billing Bridge - Stripe checkout, billing portal and webhook reconciliation
//!
//! Signed-in users start checkout or open the billing portal through this
//! service; Stripe webhooks keep the local product, price, subscription and
//! customer records in step with Stripe.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
