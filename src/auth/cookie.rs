//! Session cookie parsing and binding.

use axum::{
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};

use crate::jwt::SESSION_DURATION_SECS;

/// Cookie name for the session token.
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Writes and clears the session cookie on outgoing responses.
#[derive(Debug, Clone)]
pub struct CookieBinder {
    name: &'static str,
    max_age: u64,
}

impl Default for CookieBinder {
    fn default() -> Self {
        Self::new(SESSION_COOKIE_NAME, SESSION_DURATION_SECS)
    }
}

impl CookieBinder {
    pub fn new(name: &'static str, max_age: u64) -> Self {
        Self { name, max_age }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The Set-Cookie value carrying `token`.
    pub fn cookie(&self, token: &str, secure: bool) -> String {
        let secure = if secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            self.name, token, self.max_age, secure
        )
    }

    /// The Set-Cookie value that makes the client drop the session cookie.
    pub fn cleared_cookie(&self) -> String {
        format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", self.name)
    }

    /// Attach `token` to the response as the session cookie.
    pub fn bind(&self, response: &mut Response, token: &str, secure: bool) {
        append_set_cookie(response.headers_mut(), &self.cookie(token, secure));
    }

    /// Attach an empty, already-expired session cookie to the response.
    pub fn clear(&self, response: &mut Response) {
        append_set_cookie(response.headers_mut(), &self.cleared_cookie());
    }

    /// Whether the response already sets the session cookie.
    pub fn is_set_on(&self, response: &Response) -> bool {
        let prefix = format!("{}=", self.name);
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with(&prefix))
    }
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
    }
}
