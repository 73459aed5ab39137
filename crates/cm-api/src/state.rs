//! # Application State
//!
//! Shared state passed to every route handler and middleware via the
//! `State` extractor. Cloning is cheap: configuration is behind an `Arc` and
//! the rate limiter shares its buckets.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Immutable runtime configuration.
    pub config: Arc<AppConfig>,
    /// Per-client request limiter.
    pub limiter: RateLimiter,
}

impl AppState {
    /// Build state from configuration.
    pub fn new(config: AppConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit.clone());
        Self {
            config: Arc::new(config),
            limiter,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
