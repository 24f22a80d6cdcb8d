//! Client connection details: IP address and transport security.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

use super::state::HasAuthBackend;

/// Trait for types that provide access to HTTP headers, URI and extensions.
/// Implemented for both `Parts` and `Request` so middleware and extractors share the logic.
pub trait HasHeadersAndExtensions {
    fn headers(&self) -> &axum::http::HeaderMap;
    fn extensions(&self) -> &axum::http::Extensions;
    fn uri(&self) -> &axum::http::Uri;
}

impl HasHeadersAndExtensions for Parts {
    fn headers(&self) -> &axum::http::HeaderMap {
        &self.headers
    }
    fn extensions(&self) -> &axum::http::Extensions {
        &self.extensions
    }
    fn uri(&self) -> &axum::http::Uri {
        &self.uri
    }
}

impl<B> HasHeadersAndExtensions for axum::extract::Request<B> {
    fn headers(&self) -> &axum::http::HeaderMap {
        axum::extract::Request::headers(self)
    }
    fn extensions(&self) -> &axum::http::Extensions {
        axum::extract::Request::extensions(self)
    }
    fn uri(&self) -> &axum::http::Uri {
        axum::extract::Request::uri(self)
    }
}

/// When to set the `Secure` attribute on the session cookie.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecureCookies {
    /// Mirror the transport security of each request
    #[default]
    Auto,
    Always,
    Never,
}

/// First value of a comma-separated proxy header.
fn first_header_value<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    if first.is_empty() { None } else { Some(first) }
}

/// Whether the request arrived over a secure transport.
///
/// `X-Forwarded-Proto` is only honoured when `trust_proxy` is set.
pub fn is_secure_request<T: HasHeadersAndExtensions>(
    source: &T,
    mode: SecureCookies,
    trust_proxy: bool,
) -> bool {
    match mode {
        SecureCookies::Always => true,
        SecureCookies::Never => false,
        SecureCookies::Auto => {
            if source.uri().scheme_str() == Some("https") {
                return true;
            }
            trust_proxy
                && first_header_value(source.headers(), "x-forwarded-proto")
                    .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
        }
    }
}

/// Extract the client IP address.
///
/// With `trust_proxy` the first `X-Forwarded-For` entry wins; otherwise the
/// socket address from `ConnectInfo` is used.
pub fn extract_client_ip<T: HasHeadersAndExtensions>(
    source: &T,
    trust_proxy: bool,
) -> Result<String, &'static str> {
    if trust_proxy {
        if let Some(ip) = first_header_value(source.headers(), "x-forwarded-for") {
            return Ok(ip.to_string());
        }
    }
    source
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .ok_or("No client IP available")
}

/// Extractor yielding whether the current request should receive `Secure` cookies.
pub struct SecureTransport(pub bool);

impl<S> FromRequestParts<S> for SecureTransport
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = state.settings();
        Ok(SecureTransport(is_secure_request(
            parts,
            settings.secure_cookies,
            settings.trust_proxy,
        )))
    }
}
