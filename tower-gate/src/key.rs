use std::net::SocketAddr;

use http::Request;
use http::header::HeaderName;

use gate_limit::Identifier;

/// Derives the rate-limit key for a request.
///
/// Implemented for closures, so a one-off extractor is just
/// `|req: &Request<B>| Identifier::from(...)`.
pub trait KeyExtractor<B> {
    fn key(&self, req: &Request<B>) -> Identifier;
}

impl<B, F> KeyExtractor<B> for F
where
    F: Fn(&Request<B>) -> Identifier,
{
    fn key(&self, req: &Request<B>) -> Identifier {
        self(req)
    }
}

/// Keys requests by client IP.
///
/// Checks `X-Forwarded-For` (first entry, the original client) and
/// `X-Real-IP` before falling back to the connection's remote address. The
/// remote address is read from the request extensions: a plain
/// [`SocketAddr`], or `axum::extract::ConnectInfo` when the `axum` feature
/// is enabled.
///
/// Requests with none of these collapse onto a single shared key, which
/// fails closed: unattributable traffic shares one budget instead of each
/// request getting a fresh limiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIp;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

impl<B> KeyExtractor<B> for ClientIp {
    fn key(&self, req: &Request<B>) -> Identifier {
        // X-Forwarded-For may contain a proxy chain; the first entry is
        // the original client.
        if let Some(xff) = header_str(req, &X_FORWARDED_FOR)
            && !xff.is_empty()
        {
            if let Some(first) = xff.split(',').next() {
                return Identifier::from(first);
            }

            return Identifier::from(xff);
        }

        if let Some(xri) = header_str(req, &X_REAL_IP)
            && !xri.is_empty()
        {
            return Identifier::from(xri);
        }

        // Host portion only; the ephemeral port would make every
        // connection its own key.
        if let Some(addr) = remote_addr(req) {
            return Identifier::from(addr.ip().to_string());
        }

        Identifier::from("unknown")
    }
}

/// Keys requests by a named header, for API-key or token style limits.
///
/// Requests missing the header map to the empty identifier and therefore
/// share one budget.
#[derive(Debug, Clone)]
pub struct HeaderKey {
    name: HeaderName,
}

impl HeaderKey {
    pub fn new(name: HeaderName) -> Self {
        Self { name }
    }
}

impl<B> KeyExtractor<B> for HeaderKey {
    fn key(&self, req: &Request<B>) -> Identifier {
        Identifier::from(header_str(req, &self.name).unwrap_or_default())
    }
}

fn header_str<'r, B>(req: &'r Request<B>, name: &HeaderName) -> Option<&'r str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

fn remote_addr<B>(req: &Request<B>) -> Option<SocketAddr> {
    #[cfg(feature = "axum")]
    if let Some(info) = req
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
    {
        return Some(info.0);
    }

    req.extensions().get::<SocketAddr>().copied()
}
