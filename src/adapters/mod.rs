//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session token validation (JWT, mock)
//! - `http` - Axum routes for checkout, portal and webhooks
//! - `postgres` - JSONB-backed record store
//! - `storage` - In-memory record store
//! - `stripe` - Stripe REST client and mock provider

pub mod auth;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod stripe;
