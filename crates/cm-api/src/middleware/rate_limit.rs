//! # Per-Client Rate Limiting
//!
//! Fixed-window counter keyed by client address. In-memory only, so limits
//! are per process.
//!
//! The client key is the socket peer address. `X-Forwarded-For` is only
//! consulted when [`RateLimitConfig::trust_proxy`] is set, since any caller
//! can write that header. Without either, all requests share the
//! `"anonymous"` bucket.
//!
//! At most [`RateLimitConfig::max_clients`] buckets are tracked. Expired
//! windows are swept at most once per [`PRUNE_INTERVAL`]; a new client that
//! arrives while the table is full of live windows is rejected until the
//! next sweep frees a slot.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::RpcError;
use crate::state::AppState;

/// Minimum time between sweeps of expired buckets.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Default cap on tracked clients.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window length.
    pub window: Duration,
    /// Upper bound on the number of clients tracked at once.
    pub max_clients: usize,
    /// Key on the first `X-Forwarded-For` hop instead of the peer address.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
            max_clients: DEFAULT_MAX_CLIENTS,
            trust_proxy: false,
        }
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

#[derive(Debug)]
struct Buckets {
    clients: HashMap<String, BucketState>,
    last_prune: Instant,
}

/// Shared rate limiter state. Cloning shares the buckets.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    /// Create a rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(Buckets {
                clients: HashMap::new(),
                last_prune: Instant::now(),
            })),
        }
    }

    /// The configuration this limiter enforces.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request for `key`.
    ///
    /// Returns `Err` with the time the caller should wait when the key has
    /// used up its quota, or when the client table is full.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let window = self.config.window;
        let mut buckets = self.buckets.lock();

        if now.duration_since(buckets.last_prune) >= PRUNE_INTERVAL {
            buckets
                .clients
                .retain(|_, b| now.duration_since(b.window_start) < window);
            buckets.last_prune = now;
        }

        if !buckets.clients.contains_key(key) && buckets.clients.len() >= self.config.max_clients {
            return Err(PRUNE_INTERVAL);
        }

        let bucket = buckets.clients.entry(key.to_string()).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        let elapsed = now.duration_since(bucket.window_start);
        if elapsed >= window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            Err(window.saturating_sub(now.duration_since(bucket.window_start)))
        } else {
            bucket.count += 1;
            Ok(())
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().clients.len()
    }
}

/// Middleware that enforces the per-client limit on everything it wraps.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request, state.limiter.config().trust_proxy);

    if let Err(retry_after) = state.limiter.check(&key) {
        tracing::warn!(client = %key, path = %request.uri().path(), "rate limit exceeded");
        let mut response = RpcError::TooManyRequests.into_response();
        // Round up so clients never retry a moment too early.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        return response;
    }

    next.run(request).await
}

fn client_key(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}
