//! # tower-gate
//!
//! `tower-gate` puts a [`gate-limit`](gate_limit) registry in front of a
//! [Tower](https://github.com/tower-rs/tower) service.
//!
//! Each request is mapped to an [`Identifier`](gate_limit::Identifier) by
//! a [`KeyExtractor`] (client IP by default) and checked against the
//! registry's per-key limiter. Requests over the limit are answered
//! immediately with `429 Too Many Requests` and `Retry-After: 1`; nothing
//! is queued and the inner service never sees them.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use gate_limit::{Limiter, Registry, TokenBucket};
//! use tower_gate::RateLimitLayer;
//!
//! // 100-request bursts per client IP, refilled at 10/second.
//! let registry = Registry::new(Box::new(|_key| {
//!     Box::new(TokenBucket::new(100, 10)) as Box<dyn Limiter>
//! }))
//! .expect("factory is infallible");
//!
//! let layer = RateLimitLayer::new(Arc::new(registry));
//! // tower::ServiceBuilder::new().layer(layer).service(app);
//! ```
//!
//! ## Feature Flags
//! - `axum`: reads the client address from `axum::extract::ConnectInfo`
//!   when the usual proxy headers are absent.

mod key;
mod layer;
mod service;


pub use key::ClientIp;
pub use key::HeaderKey;
pub use key::KeyExtractor;
pub use layer::RateLimitLayer;
pub use service::RateLimitService;
