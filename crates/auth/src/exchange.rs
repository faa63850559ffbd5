//! Refresh exchange against the token endpoint
//!
//! One interaction: POST `grant_type=refresh_token` form data to the
//! configured endpoint and parse the new pair out of the response. The
//! endpoint and client id come from configuration rather than constants so
//! the same client works against any issuer.
//!
//! `TokenExchange` is a trait so the coordinator can be driven by a mock
//! in tests; `HttpTokenExchange` is the reqwest-backed implementation.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Response from the token endpoint for a refresh.
///
/// `expires_in` is a delta in seconds from the response time, when the
/// endpoint reports one. The caller converts this to an absolute unix
/// millisecond timestamp when storing the credential.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Abstraction over the refresh exchange.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn TokenExchange>` inside the coordinator).
pub trait TokenExchange: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenResponse>> + Send + 'a>>;
}

/// reqwest-backed exchange client.
pub struct HttpTokenExchange {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: Option<Secret<String>>,
}

impl HttpTokenExchange {
    pub fn new(
        client: reqwest::Client,
        token_endpoint: String,
        client_id: String,
        client_secret: Option<Secret<String>>,
    ) -> Self {
        Self {
            client,
            token_endpoint,
            client_id,
            client_secret,
        }
    }

    /// Refresh an access token using a refresh token.
    ///
    /// 401/403 from the token endpoint means the refresh token itself is
    /// revoked or invalid — mapped to `Error::Rejected` so the caller can
    /// distinguish "session over" from a transient exchange failure.
    async fn refresh_inner(&self, refresh: &str) -> Result<TokenResponse> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.expose().as_str()));
        }

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::Rejected(format!(
                    "refresh token rejected ({status}): {body}"
                )));
            }

            return Err(Error::Exchange(format!(
                "token refresh returned {status}: {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::Exchange(format!("invalid refresh response: {e}")))
    }
}

impl TokenExchange for HttpTokenExchange {
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenResponse>> + Send + 'a>> {
        Box::pin(self.refresh_inner(refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve one canned HTTP response on a local port and return the
    /// endpoint URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}/oauth/token")
    }

    fn exchange_for(endpoint: String) -> HttpTokenExchange {
        HttpTokenExchange::new(reqwest::Client::new(), endpoint, "client-1".into(), None)
    }

    #[test]
    fn token_response_deserializes() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def","expires_in":3600}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at_abc");
        assert_eq!(token.refresh_token, "rt_def");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[test]
    fn token_response_without_expiry() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.expires_in, None);
    }

    #[test]
    fn token_response_serializes() {
        let token = TokenResponse {
            access_token: "at_test".into(),
            refresh_token: "rt_test".into(),
            expires_in: Some(3600),
        };
        let json = serde_json::to_string(&token).unwrap();
        assert!(json.contains("\"access_token\":\"at_test\""));
        assert!(json.contains("\"refresh_token\":\"rt_test\""));
        assert!(json.contains("\"expires_in\":3600"));
    }

    #[tokio::test]
    async fn endpoint_success_parses_new_pair() {
        let url = serve_once(
            "200 OK",
            r#"{"access_token":"at_new","refresh_token":"rt_new","expires_in":3600}"#,
        )
        .await;
        let token = exchange_for(url).refresh("rt_old").await.unwrap();
        assert_eq!(token.access_token, "at_new");
        assert_eq!(token.refresh_token, "rt_new");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn endpoint_401_is_rejected() {
        // A 401 means the refresh token itself is revoked — the session
        // is over, not retryable
        let url = serve_once("401 Unauthorized", r#"{"error":"invalid_grant"}"#).await;
        let result = exchange_for(url).refresh("rt_revoked").await;
        match result {
            Err(Error::Rejected(msg)) => assert!(msg.contains("invalid_grant"), "got: {msg}"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn endpoint_403_is_rejected() {
        let url = serve_once("403 Forbidden", r#"{"error":"access_denied"}"#).await;
        let result = exchange_for(url).refresh("rt_revoked").await;
        match result {
            Err(Error::Rejected(_)) => {}
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn endpoint_500_is_exchange_error_not_rejected() {
        // Server trouble must not read as a revoked session
        let url = serve_once("500 Internal Server Error", "boom").await;
        let result = exchange_for(url).refresh("rt_ok").await;
        match result {
            Err(Error::Exchange(msg)) => assert!(msg.contains("500"), "got: {msg}"),
            other => panic!("expected Exchange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn endpoint_garbage_body_is_exchange_error() {
        let url = serve_once("200 OK", "not json").await;
        let result = exchange_for(url).refresh("rt_ok").await;
        match result {
            Err(Error::Exchange(_)) => {}
            other => panic!("expected Exchange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_against_unreachable_endpoint_is_http_error() {
        // Port 9 (discard) refuses connections — the error must be Http,
        // not Rejected, so the coordinator treats it as a failed cycle
        // rather than a revoked session with a different message.
        let exchange = HttpTokenExchange::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/oauth/token".into(),
            "client-1".into(),
            None,
        );
        let result = exchange.refresh("rt_any").await;
        match result {
            Err(Error::Http(_)) => {}
            other => panic!("expected Http error, got {other:?}"),
        }
    }
}
