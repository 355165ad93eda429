//! Core abstractions for the prerender edge gateway.
//!
//! This crate provides:
//! - `GatewayConfig` - Environment-driven runtime configuration
//! - `RequestId` - Per-request identifier for log correlation

mod config;
mod context;

pub use config::*;
pub use context::*;
