//! Session termination on unrecoverable refresh failure
//!
//! When the refresh exchange itself fails there is nothing left to retry
//! with: the terminator clears the credential store and signals the host
//! exactly once per failed cycle, no matter how many requests were queued
//! behind the refresh.

use std::sync::Arc;

use tokenflight_auth::CredentialStore;
use tracing::warn;

/// The session-ended notification delivered to the host.
#[derive(Debug, Clone)]
pub struct SessionEnded {
    pub error: tokenflight_auth::Error,
}

/// Host-side receiver for the session-end signal (navigation to login, an
/// event bus, anything). Called at most once per failed refresh cycle.
pub trait SessionSink: Send + Sync {
    fn session_ended(&self, ended: SessionEnded);
}

/// `SessionSink` adapter for hosts that consume an event stream.
///
/// Send failures are ignored: a host that dropped its receiver has already
/// moved on.
pub struct ChannelSink(tokio::sync::mpsc::UnboundedSender<SessionEnded>);

impl ChannelSink {
    pub fn new(sender: tokio::sync::mpsc::UnboundedSender<SessionEnded>) -> Self {
        Self(sender)
    }
}

impl SessionSink for ChannelSink {
    fn session_ended(&self, ended: SessionEnded) {
        let _ = self.0.send(ended);
    }
}

/// Clears credentials and fires the session-end signal.
pub struct SessionTerminator {
    store: Arc<CredentialStore>,
    sink: Arc<dyn SessionSink>,
}

impl SessionTerminator {
    pub fn new(store: Arc<CredentialStore>, sink: Arc<dyn SessionSink>) -> Self {
        Self { store, sink }
    }

    /// End the session: clear the store, then notify the host.
    ///
    /// The caller (the refresh cycle leader) guarantees this runs once per
    /// cycle. A failure to persist the cleared state is logged and
    /// swallowed — the in-memory credential is gone either way.
    pub async fn terminate(&self, error: &tokenflight_auth::Error) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to persist cleared credential state");
        }
        warn!(error = %error, "session terminated after refresh failure");
        self.sink.session_ended(SessionEnded {
            error: error.clone(),
        });
    }
}
