use axum::http::Request;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower_governor::{key_extractor::KeyExtractor, GovernorError};

/// Per-client key for the `/api` rate limiter.
///
/// Uses the first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
/// Requests with none of these share the loopback bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)?
        .to_str()
        .ok()?
        // First entry is the original client
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = || {
            req.extensions()
                .get::<axum::extract::ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip())
        };

        // Proxy headers first, they carry the real client behind a reverse proxy
        Ok(header_ip(req, "x-forwarded-for")
            .or_else(|| header_ip(req, "x-real-ip"))
            // Direct connection
            .or_else(peer)
            // Fallback for clients with no identifiable address
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)))
    }
}
