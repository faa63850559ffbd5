//! Re-sendable request and buffered response types
//!
//! `RequestContext` carries a fully buffered body so the transport can send
//! it more than once. Streaming bodies are deliberately unrepresentable
//! here; a request that needs one cannot go through the replay path.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

/// An outbound request that supports header mutation and a second send.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    replayed: bool,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            replayed: false,
        }
    }

    /// Convenience constructor for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Whether this request has already gone through one refresh+replay
    /// cycle. A replayed request that expires again fails terminally
    /// instead of queuing for a second refresh.
    pub fn replayed(&self) -> bool {
        self.replayed
    }

    pub(crate) fn mark_replayed(&mut self) {
        self.replayed = true;
    }
}

/// Attach `token` as a bearer credential, replacing any existing value.
///
/// The header is marked sensitive so it stays out of Debug output. A token
/// that is not a valid header value is skipped; the request then goes out
/// unauthenticated and the 401 path reports it.
pub(crate) fn set_bearer(headers: &mut HeaderMap, token: &str) {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(e) => {
            tracing::warn!(error = %e, "access token is not a valid header value, sending without it");
        }
    }
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 for error messages, lossy and truncated.
    pub(crate) fn body_preview(&self) -> String {
        const MAX: usize = 256;
        let text = String::from_utf8_lossy(&self.body);
        let mut preview: String = text.chars().take(MAX).collect();
        if text.chars().count() > MAX {
            preview.push('…');
        }
        preview
    }
}
