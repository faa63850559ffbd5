//! Request replay with a freshly obtained credential

use std::sync::Arc;

use tracing::debug;

use crate::context::{RequestContext, Response, set_bearer};
use crate::transport::{Transport, TransportError};

/// Re-sends an original request with a new access token.
///
/// Only the network send is re-run — the body is the already-buffered
/// bytes, never rebuilt. The context is marked replayed *before* the
/// resubmission, so an expired-credential response to the replay is
/// classified as terminal rather than queuing a second refresh.
pub struct RequestReplayer {
    transport: Arc<dyn Transport>,
}

impl RequestReplayer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn replay(
        &self,
        ctx: &mut RequestContext,
        access_token: &str,
    ) -> Result<Response, TransportError> {
        ctx.mark_replayed();
        set_bearer(&mut ctx.headers, access_token);
        metrics::counter!("replays_total").increment(1);
        debug!(url = %ctx.url, "replaying request with refreshed credential");
        self.transport.send(ctx).await
    }
}
