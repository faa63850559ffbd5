//! Transport abstraction over the network send
//!
//! The `Transport` trait covers exactly one concern: send a buffered
//! request, return a buffered response. Everything the refresh subsystem
//! does (augmentation, classification, replay) happens around it, so tests
//! drive the whole client with scripted transports.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Transport>` shared between the client and the replayer).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::context::{RequestContext, Response};

/// A request that could not be sent or whose response could not be read.
///
/// Distinct from upstream error *statuses*, which come back as normal
/// `Response` values.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Result alias for transport sends.
pub type SendResult = std::result::Result<Response, TransportError>;

/// Sends a re-sendable request. Implementations must not mutate the
/// context; the caller owns headers and the replay flag.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = SendResult> + Send + 'a>>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn send_inner(&self, ctx: &RequestContext) -> SendResult {
        let response = self
            .client
            .request(ctx.method.clone(), &ctx.url)
            .headers(ctx.headers.clone())
            .body(ctx.body.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError(format!("request to {} failed: {e}", ctx.url)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("reading response body from {}: {e}", ctx.url)))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = SendResult> + Send + 'a>> {
        Box::pin(self.send_inner(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        let transport = HttpTransport::new(reqwest::Client::new(), Duration::from_secs(5));
        let ctx = RequestContext::get("http://127.0.0.1:9/unreachable");
        let result = transport.send(&ctx).await;
        let err = result.unwrap_err();
        assert!(err.0.contains("127.0.0.1:9"), "got: {}", err.0);
    }
}
