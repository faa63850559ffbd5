//! Client wiring: augment, send, classify, refresh, replay
//!
//! `Client::send` is the single entry point. A successful refresh cycle is
//! invisible to the caller — the replayed response comes back as if no
//! expiry had occurred. A failed cycle surfaces as `RefreshFailed` after
//! the session has been terminated exactly once.

use std::sync::Arc;

use tokenflight_auth::{CredentialStore, HttpTokenExchange, TokenExchange};
use tracing::debug;

use crate::augment::RequestAugmenter;
use crate::classify::{Outcome, classify};
use crate::config::Config;
use crate::context::{RequestContext, Response};
use crate::coordinator::RefreshCoordinator;
use crate::error::{Error, Result};
use crate::replay::RequestReplayer;
use crate::session::{SessionSink, SessionTerminator};
use crate::transport::{HttpTransport, Transport};

/// HTTP client with transparent single-flight credential refresh.
pub struct Client {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    augmenter: RequestAugmenter,
    coordinator: RefreshCoordinator,
    replayer: RequestReplayer,
}

impl Client {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        sink: Arc<dyn SessionSink>,
    ) -> Self {
        let terminator = SessionTerminator::new(store.clone(), sink);
        Self {
            transport: transport.clone(),
            store: store.clone(),
            augmenter: RequestAugmenter::new(store.clone()),
            coordinator: RefreshCoordinator::new(exchange, store, terminator),
            replayer: RequestReplayer::new(transport),
        }
    }

    /// Build a client from config: reqwest transport, HTTP refresh
    /// exchange, and a file-backed or in-memory credential store.
    pub async fn from_config(config: Config, sink: Arc<dyn SessionSink>) -> common::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| common::Error::Config(format!("building http client: {e}")))?;

        let store = match &config.credentials.path {
            Some(path) => Arc::new(
                CredentialStore::load(path.clone())
                    .await
                    .map_err(|e| common::Error::Config(format!("loading credential store: {e}")))?,
            ),
            None => Arc::new(CredentialStore::in_memory()),
        };

        let exchange = Arc::new(HttpTokenExchange::new(
            http.clone(),
            config.exchange.token_endpoint.clone(),
            config.exchange.client_id.clone(),
            config.exchange.client_secret.clone(),
        ));
        let transport = Arc::new(HttpTransport::new(http, config.client.timeout()));

        Ok(Self::new(transport, store, exchange, sink))
    }

    /// The credential store backing this client, for seeding the initial
    /// pair after login and inspecting session state.
    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Send a request, transparently refreshing and replaying once on an
    /// expired credential.
    ///
    /// Upstream statuses other than 401/403 come back as `Ok(Response)`
    /// untouched — they are not this subsystem's concern.
    pub async fn send(&self, mut ctx: RequestContext) -> Result<Response> {
        self.augmenter.augment(&mut ctx).await;
        let response = self.transport.send(&ctx).await?;

        match classify(response.status, ctx.replayed()) {
            Outcome::Unrelated => Ok(response),
            Outcome::AuthorizationDenied => Err(Error::AuthorizationDenied(denial_message(&response))),
            Outcome::CredentialExpired => {
                debug!(url = %ctx.url, "expired credential response, entering refresh");
                let pair = self.coordinator.refresh().await?;
                let replayed = self.replayer.replay(&mut ctx, &pair.access).await?;

                match classify(replayed.status, ctx.replayed()) {
                    Outcome::Unrelated => Ok(replayed),
                    // Fresh token also rejected: terminal for this request.
                    Outcome::AuthorizationDenied | Outcome::CredentialExpired => {
                        Err(Error::AuthorizationDenied(denial_message(&replayed)))
                    }
                }
            }
        }
    }
}

fn denial_message(response: &Response) -> String {
    format!(
        "upstream returned {}: {}",
        response.status,
        response.body_preview()
    )
}
