//! Error types for the client layer
//!
//! Only expired-credential responses are absorbed and retried inside the
//! client; everything here surfaces to the caller. Upstream statuses other
//! than 401/403 are not errors at this layer — they come back as
//! `Ok(Response)` untouched.

use crate::transport::TransportError;

/// Errors surfaced by `Client::send`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Forbidden response, or an expired-credential response on a request
    /// that was already replayed once.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The refresh exchange failed; the session has been terminated.
    #[error("refresh failed: {0}")]
    RefreshFailed(#[from] tokenflight_auth::Error),

    /// The request could not be sent at all.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
