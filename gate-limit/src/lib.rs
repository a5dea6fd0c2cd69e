//! # gate-limit
//!
//! `gate-limit` provides non-blocking admission-control rate limiting.
//!
//! ## Core Philosophy
//!
//! Every limiter answers a single boolean question, *may this request
//! proceed right now?*, without blocking, queuing, or reordering. State is
//! recalculated lazily at the moment of the request; there are no
//! background threads or timers.
//!
//! ## Key Concepts
//!
//! * **Limiter Trait**: a unified `allow() -> bool` surface over five
//!   algorithms with different burst and smoothing characteristics.
//! * **Injected Clock**: every limiter takes a [`Clock`] at construction.
//!   Production uses [`SystemClock`]; tests drive a [`ManualClock`].
//! * **Per-Key Registry**: [`Registry`] multiplexes decisions across many
//!   independent identities (users, IPs, API keys), creating limiters
//!   lazily from a factory.
//!
//! ## Example
//!
//! ```rust
//! use gate_limit::{Limiter, TokenBucket};
//!
//! // Bursts of up to 100 requests, refilled at 10 tokens/second.
//! let bucket = TokenBucket::new(100, 10);
//!
//! if bucket.allow() {
//!     // Request admitted
//! }
//! ```
//!
//! ## Choosing a strategy
//!
//! * [`TokenBucket`]: burst-tolerant, linear refill. Starts full.
//! * [`LeakyBucket`]: smooth output pacing. Starts empty, drains linearly.
//! * [`FixedWindow`]: counter over epoch-aligned windows. Cheapest, but
//!   permits boundary bursts.
//! * [`SlidingWindow`]: exact rolling count over the trailing window.
//! * [`Gcra`]: single-timestamp rate + burst encoding, the smoothest of
//!   the five.

use std::fmt::Debug;

mod clock;
mod error;
mod fixed_window;
mod gcra;
mod leaky_bucket;
mod registry;
mod sliding_window;
mod token_bucket;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::ConfigError;
pub use fixed_window::FixedWindow;
pub use gcra::Gcra;
pub use leaky_bucket::LeakyBucket;
pub use registry::{Identifier, LimiterFactory, Registry};
pub use sliding_window::SlidingWindow;
pub use token_bucket::TokenBucket;

/// The core trait for all rate-limiting algorithms.
///
/// Limiters must be `Send` and `Sync` to allow sharing across thread
/// boundaries via `Arc`.
pub trait Limiter: Debug + Send + Sync {
    /// Attempts to admit a single request.
    ///
    /// Returns `true` if the request may proceed and the limiter's state
    /// has been advanced, `false` if it must be rejected. Never blocks and
    /// cannot fail; a denial leaves state untouched apart from the
    /// refill/expiry bookkeeping that time passing would have caused
    /// anyway.
    fn allow(&self) -> bool;
}
