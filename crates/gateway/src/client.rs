//! Multicast send client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::GatewayError;
use crate::payload::{MulticastRequest, MulticastResponse, NotificationMessage, TokenStatus};

/// Push gateway collaborator interface.
///
/// One call sends one batch. Implementations must report per-token
/// outcomes positionally aligned with `tokens`, or fail the batch as a
/// whole with a [`GatewayError`].
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send_multicast(
        &self,
        tokens: Vec<String>,
        message: &NotificationMessage,
    ) -> Result<Vec<TokenStatus>, GatewayError>;
}

/// Connection settings for the HTTP gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Multicast send endpoint.
    pub send_url: String,
    /// OAuth2 token endpoint for the service-account exchange.
    pub oauth_token_url: String,
    /// Path to the service-account JSON credentials.
    pub service_account_path: String,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

/// HTTP implementation of [`PushGateway`].
///
/// Constructed once at process start and shared by reference across
/// invocations; the underlying connection pool and token cache are reused.
pub struct HttpPushGateway {
    http_client: Client,
    send_url: String,
    auth: TokenProvider,
}

impl HttpPushGateway {
    /// Build the client and load service-account credentials.
    pub async fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder().timeout(config.request_timeout).build()?;

        let auth = TokenProvider::from_file(
            http_client.clone(),
            config.oauth_token_url,
            &config.service_account_path,
        )
        .await?;

        debug!(project_id = %auth.project_id(), "Push gateway client initialized");

        Ok(Self {
            http_client,
            send_url: config.send_url,
            auth,
        })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send_multicast(
        &self,
        tokens: Vec<String>,
        message: &NotificationMessage,
    ) -> Result<Vec<TokenStatus>, GatewayError> {
        let token_count = tokens.len();
        let access_token = self.auth.access_token().await?;
        let request = MulticastRequest::new(tokens, message);

        let response = self
            .http_client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MulticastResponse = response.json().await?;
        debug!(
            tokens = token_count,
            results = parsed.results.len(),
            "Multicast batch accepted"
        );

        Ok(parsed.results)
    }
}

#[cfg(test)]
impl HttpPushGateway {
    /// Build a client against a mock server with a pre-seeded bearer token.
    pub(crate) async fn mock(send_url: String) -> Self {
        let auth = TokenProvider::mock("http://unreachable.invalid/token".to_string());
        auth.set_cached_token("test-access-token", Duration::from_secs(3600))
            .await;

        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
            send_url,
            auth,
        }
    }
}
