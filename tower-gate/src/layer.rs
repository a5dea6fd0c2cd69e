use std::sync::Arc;

use tower::Layer;

use gate_limit::Registry;

use crate::key::ClientIp;
use crate::service::RateLimitService;

/// Applies per-key rate limiting to requests.
///
/// Keys default to the client IP ([`ClientIp`]); swap the extractor with
/// [`RateLimitLayer::with_key_extractor`].
#[derive(Debug)]
pub struct RateLimitLayer<K = ClientIp> {
    registry: Arc<Registry>,
    keys: K,
}

impl RateLimitLayer<ClientIp> {
    /// Creates a layer that keys requests by client IP.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            keys: ClientIp,
        }
    }
}

impl<K> RateLimitLayer<K> {
    /// Replaces the key extractor with any [`KeyExtractor`](crate::KeyExtractor).
    pub fn with_key_extractor<K2>(self, keys: K2) -> RateLimitLayer<K2> {
        RateLimitLayer {
            registry: self.registry,
            keys,
        }
    }
}

impl<K> Clone for RateLimitLayer<K>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            keys: self.keys.clone(),
        }
    }
}

impl<K, S> Layer<S> for RateLimitLayer<K>
where
    K: Clone,
{
    type Service = RateLimitService<K, S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService::new(service, Arc::clone(&self.registry), self.keys.clone())
    }
}
