//! Application layer - command handlers that orchestrate the billing flows
//! across ports.

pub mod handlers;
