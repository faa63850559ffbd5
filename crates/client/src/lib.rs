//! HTTP client layer with single-flight credential refresh
//!
//! Every outbound request picks up the current access token at send time.
//! When a response comes back as expired-credential (401), the request
//! enters the `RefreshCoordinator`: the first arrival runs exactly one
//! refresh exchange while later arrivals park as waiters, and the outcome
//! fans out to all of them. Recovered requests are replayed once with the
//! new token; an unrecoverable refresh failure ends the session exactly
//! once via the `SessionTerminator`.
//!
//! Request lifecycle:
//! 1. `RequestAugmenter` attaches the bearer header from the store
//! 2. `Transport` sends the buffered request
//! 3. The response is classified (expired / denied / unrelated)
//! 4. Expired → `RefreshCoordinator::refresh()` → `RequestReplayer`
//! 5. A replayed request that expires again fails terminally

pub mod augment;
pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod replay;
pub mod session;
pub mod transport;

pub use augment::RequestAugmenter;
pub use classify::{Outcome, classify};
pub use client::Client;
pub use config::Config;
pub use context::{RequestContext, Response};
pub use coordinator::RefreshCoordinator;
pub use error::{Error, Result};
pub use replay::RequestReplayer;
pub use session::{ChannelSink, SessionEnded, SessionSink, SessionTerminator};
pub use transport::{HttpTransport, Transport, TransportError};
