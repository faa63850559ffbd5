//! Credential storage and refresh exchange for tokenflight
//!
//! Holds the access/refresh token pair and talks to the refresh endpoint.
//! This crate is a standalone library with no dependency on the client
//! layer — it can be tested and used independently.
//!
//! Credential flow:
//! 1. Host stores the initial pair via `CredentialStore::set_pair()`
//! 2. The client layer reads the access token per request
//! 3. On an expired-credential response, the coordinator calls
//!    `TokenExchange::refresh()` with the stored refresh token
//! 4. The new pair replaces the old one atomically via `set_pair()`
//! 5. On unrecoverable refresh failure, `CredentialStore::clear()` ends
//!    the session's credentials

pub mod credentials;
pub mod error;
pub mod exchange;

pub use credentials::{CredentialStore, TokenPair};
pub use error::{Error, Result};
pub use exchange::{HttpTokenExchange, TokenExchange, TokenResponse};
