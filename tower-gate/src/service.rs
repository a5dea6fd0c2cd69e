use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use futures::future::Either;
use futures::future::Ready;
use futures::future::ready;
use http::Request;
use http::Response;
use http::StatusCode;
use http::header::HeaderValue;
use http::header::RETRY_AFTER;
use tower::Service;

use gate_limit::Registry;

use crate::key::KeyExtractor;

/// Admission-checks each request against a per-key [`Registry`] before it
/// reaches the inner service.
///
/// Rejected requests are answered directly with `429 Too Many Requests`
/// and `Retry-After: 1`; the inner service is never polled for them. The
/// decision is non-blocking, so this service is always ready whenever the
/// inner service is.
pub struct RateLimitService<K, S> {
    inner: S,
    registry: Arc<Registry>,
    keys: K,
}

impl<K, S> RateLimitService<K, S> {
    pub fn new(inner: S, registry: Arc<Registry>, keys: K) -> Self {
        Self {
            inner,
            registry,
            keys,
        }
    }
}

impl<K, S> Clone for RateLimitService<K, S>
where
    K: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            registry: Arc::clone(&self.registry),
            keys: self.keys.clone(),
        }
    }
}

impl<K, S, ReqBody, ResBody> Service<Request<ReqBody>> for RateLimitService<K, S>
where
    K: KeyExtractor<ReqBody>,
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Self::Response, Self::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let key = self.keys.key(&req);

        if self.registry.allow(&key) {
            Either::Right(self.inner.call(req))
        } else {
            tracing::debug!(key = %key, "rate limit exceeded");
            Either::Left(ready(Ok(too_many_requests())))
        }
    }
}

fn too_many_requests<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from_static("1"));

    response
}
