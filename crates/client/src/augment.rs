//! Request augmentation with the current access credential

use std::sync::Arc;

use tokenflight_auth::CredentialStore;

use crate::context::{RequestContext, set_bearer};

/// Attaches the current access token to outbound requests.
///
/// Reads the store at the moment of sending, not at request construction
/// time, so a request built before a refresh still goes out with the
/// newest token. No side effects beyond the read.
pub struct RequestAugmenter {
    store: Arc<CredentialStore>,
}

impl RequestAugmenter {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Set the bearer header from the store. A request with no stored
    /// token goes out unauthenticated; the 401 path handles the rest.
    pub async fn augment(&self, ctx: &mut RequestContext) {
        if let Some(token) = self.store.access_token().await {
            set_bearer(&mut ctx.headers, &token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use tokenflight_auth::TokenPair;

    #[tokio::test]
    async fn augment_reads_store_at_send_time() {
        let store = Arc::new(CredentialStore::in_memory());
        let augmenter = RequestAugmenter::new(store.clone());

        // Request built before any credential exists
        let mut ctx = RequestContext::get("https://api.example.com/points");

        store
            .set_pair(TokenPair {
                access: "T1".into(),
                refresh: "R1".into(),
                expires_at: None,
            })
            .await
            .unwrap();

        augmenter.augment(&mut ctx).await;
        assert_eq!(ctx.headers.get(AUTHORIZATION).unwrap(), "Bearer T1");

        // Token rotates; the same context picks up the new one on re-augment
        store
            .set_pair(TokenPair {
                access: "T2".into(),
                refresh: "R2".into(),
                expires_at: None,
            })
            .await
            .unwrap();

        augmenter.augment(&mut ctx).await;
        assert_eq!(ctx.headers.get(AUTHORIZATION).unwrap(), "Bearer T2");
    }

    #[tokio::test]
    async fn empty_store_leaves_request_unauthenticated() {
        let store = Arc::new(CredentialStore::in_memory());
        let augmenter = RequestAugmenter::new(store);

        let mut ctx = RequestContext::get("https://api.example.com/points");
        augmenter.augment(&mut ctx).await;
        assert!(ctx.headers.get(AUTHORIZATION).is_none());
    }
}
