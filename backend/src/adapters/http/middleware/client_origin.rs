//! Client origin extraction.
//!
//! The service usually sits behind a reverse proxy, so the TCP peer is the
//! proxy. Forwarding headers are consulted first, in this order:
//!
//! 1. First entry of `X-Forwarded-For`
//! 2. `X-Real-IP`
//! 3. `CF-Connecting-IP`
//! 4. The peer address from `ConnectInfo<SocketAddr>`
//!
//! The result is the raw string; public-address validation happens in the
//! domain when the origin is compared or bound.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::HeaderMap;

const FORWARDING_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// The caller's network origin as seen by this service. Empty when nothing
/// identifies the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

fn from_headers(headers: &HeaderMap) -> Option<String> {
    FORWARDING_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

impl<S> axum::extract::FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let origin = from_headers(&parts.headers).or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            });
            Ok(ClientOrigin(origin.unwrap_or_default()))
        })
    }
}
