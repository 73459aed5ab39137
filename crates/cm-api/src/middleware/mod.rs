//! # Middleware
//!
//! - [`rate_limit`]: per-client fixed-window request limit.
//! - [`security_headers`]: hardening headers on every response.

pub mod rate_limit;
pub mod security_headers;
