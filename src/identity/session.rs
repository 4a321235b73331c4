use std::time::Duration;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use super::auth_error::Unauthenticated;
use crate::config::Config;

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }
}

/// Attributes of the session cookie. Production gets `Secure` and `SameSite=Strict`;
/// development keeps `Lax` so a local frontend on another port still works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age: Duration,
}

impl CookieOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let prod = cfg.environment.is_production();
        Self {
            http_only: true,
            secure: prod,
            same_site: if prod { SameSite::Strict } else { SameSite::Lax },
            max_age: cfg.token_ttl,
        }
    }

    fn attributes(&self, max_age_secs: u64) -> String {
        let mut s = format!("Max-Age={}; Path=/; SameSite={}", max_age_secs, self.same_site.as_str());
        if self.http_only { s.push_str("; HttpOnly"); }
        if self.secure { s.push_str("; Secure"); }
        s
    }

    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        HeaderValue::from_str(&format!("{}={}; {}", SESSION_COOKIE, token, self.attributes(self.max_age.as_secs())))
    }

    pub fn cleared_cookie(&self) -> HeaderValue {
        let raw = format!("{}=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; {}", SESSION_COOKIE, self.attributes(0));
        HeaderValue::from_str(&raw).unwrap_or_else(|_| HeaderValue::from_static("token=; Max-Age=0; Path=/"))
    }

    /// Headers that set the session cookie, for handlers that answer with `(headers, body)`.
    pub fn set_headers(&self, token: &str) -> Result<HeaderMap, axum::http::header::InvalidHeaderValue> {
        let mut h = HeaderMap::new();
        h.insert(SET_COOKIE, self.session_cookie(token)?);
        Ok(h)
    }

    pub fn clear_headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(SET_COOKIE, self.cleared_cookie());
        h
    }
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(COOKIE) {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k.trim() == name { return Some(v.trim().to_string()); }
            }
        }
    }
    None
}

/// Pull the session token out of the cookie transport.
///
/// No cookie header at all is a client wiring problem (`MissingTransport`); a cookie
/// header without a usable token usually means the session cookie expired (`MissingToken`).
pub fn extract_session_token(headers: &HeaderMap) -> Result<String, Unauthenticated> {
    if !headers.contains_key(COOKIE) {
        return Err(Unauthenticated::MissingTransport);
    }
    match parse_cookie(headers, SESSION_COOKIE) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(Unauthenticated::MissingToken),
    }
}
