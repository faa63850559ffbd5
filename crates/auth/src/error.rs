//! Error types for credential and refresh-exchange operations

/// Errors from credential and refresh-exchange operations.
///
/// `Clone` because a single refresh failure fans out to every request
/// queued behind the in-flight exchange.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("refresh credential rejected: {0}")]
    Rejected(String),

    #[error("no refresh credential in store")]
    MissingCredential,

    #[error("credential parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("refresh cycle interrupted before completion")]
    Interrupted,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
