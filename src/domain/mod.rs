//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - Shared primitives (ids, timestamps, records, auth)
//! - `billing` - Stripe payloads, signature verification, event
//!   classification and record field mappings

pub mod billing;
pub mod foundation;
