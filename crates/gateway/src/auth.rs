//! OAuth2 service-account authentication for the push gateway.
//!
//! Signs a short-lived JWT assertion with the service account's private
//! key, exchanges it for an access token at the provider's token endpoint,
//! and caches the token until shortly before expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::trace;

use crate::error::GatewayError;

/// OAuth2 scope granting messaging send access.
const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Cached access-token lifetime (50 minutes; tokens are issued for 60).
const TOKEN_LIFETIME: Duration = Duration::from_secs(50 * 60);

/// Service account JSON structure.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceAccount {
    pub(crate) project_id: String,
    pub(crate) private_key: String,
    pub(crate) client_email: String,
}

/// JWT claims for the OAuth2 assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// OAuth2 token request.
#[derive(Debug, Serialize)]
struct TokenRequest {
    grant_type: String,
    assertion: String,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cached access token with its local expiry.
pub(crate) struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Provider of bearer tokens for gateway requests.
pub struct TokenProvider {
    http_client: Client,
    token_url: String,
    service_account: ServiceAccount,
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Load service-account credentials from a JSON file.
    pub async fn from_file(
        http_client: Client,
        token_url: String,
        path: &str,
    ) -> Result<Self, GatewayError> {
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::Auth(format!("Failed to read service account file '{path}': {e}"))
        })?;

        let service_account: ServiceAccount = serde_json::from_str(&data)
            .map_err(|e| GatewayError::Auth(format!("Failed to parse service account JSON: {e}")))?;

        let encoding_key = EncodingKey::from_rsa_pem(service_account.private_key.as_bytes())
            .map_err(|e| GatewayError::Auth(format!("Failed to parse service account key: {e}")))?;

        Ok(Self {
            http_client,
            token_url,
            service_account,
            encoding_key,
            algorithm: Algorithm::RS256,
            cached: RwLock::new(None),
        })
    }

    /// Project id from the service account, for log correlation.
    pub fn project_id(&self) -> &str {
        &self.service_account.project_id
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn access_token(&self) -> Result<String, GatewayError> {
        // Fast path under the read lock
        {
            let cached = self.cached.read().await;
            if let Some(ref token) = *cached
                && token.expires_at > SystemTime::now()
            {
                return Ok(token.token.clone());
            }
        }

        // Write lock with a double check so concurrent batches refresh once
        let mut cached = self.cached.write().await;
        if let Some(ref token) = *cached
            && token.expires_at > SystemTime::now()
        {
            return Ok(token.token.clone());
        }

        let token = self.exchange_assertion().await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: SystemTime::now() + TOKEN_LIFETIME,
        });

        trace!("Refreshed gateway access token");
        Ok(token)
    }

    /// Sign a fresh assertion and exchange it for an access token.
    async fn exchange_assertion(&self) -> Result<String, GatewayError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GatewayError::Auth(format!("System time error: {e}")))?
            .as_secs();

        let claims = AssertionClaims {
            iss: self.service_account.client_email.clone(),
            scope: MESSAGING_SCOPE.to_string(),
            aud: self.token_url.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(self.algorithm);
        let assertion = encode(&header, &claims, &self.encoding_key)?;

        let request = TokenRequest {
            grant_type: "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string(),
            assertion,
        };

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!(
                "Token exchange failed: {status} - {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.access_token)
    }
}

#[cfg(test)]
impl TokenProvider {
    /// Build a provider with symmetric-key signing for tests.
    pub(crate) fn mock(token_url: String) -> Self {
        Self {
            http_client: Client::new(),
            token_url,
            service_account: ServiceAccount {
                project_id: "test-project".to_string(),
                private_key: "test-key".to_string(),
                client_email: "courier@test-project.iam.gserviceaccount.com".to_string(),
            },
            encoding_key: EncodingKey::from_secret(b"test-key"),
            algorithm: Algorithm::HS256,
            cached: RwLock::new(None),
        }
    }

    /// Seed the token cache, bypassing the exchange.
    pub(crate) async fn set_cached_token(&self, token: &str, ttl: Duration) {
        let mut cached = self.cached.write().await;
        *cached = Some(CachedToken {
            token: token.to_string(),
            expires_at: SystemTime::now() + ttl,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cached_token_returned_without_exchange() {
        let provider = TokenProvider::mock("http://unreachable.invalid/token".to_string());
        provider
            .set_cached_token("cached-access-token", Duration::from_secs(3600))
            .await;

        let token = provider.access_token().await.unwrap();
        assert_eq!(token, "cached-access-token");
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_exchange() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = TokenProvider::mock(format!("{}/token", mock_server.uri()));
        provider
            .set_cached_token("stale-token", Duration::from_secs(0))
            .await;

        // Expired entry forces a refresh through the mocked endpoint
        tokio::time::sleep(Duration::from_millis(10)).await;
        let token = provider.access_token().await.unwrap();
        assert_eq!(token, "fresh-token");
    }

    #[tokio::test]
    async fn test_exchange_failure_surfaces_as_auth_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = TokenProvider::mock(format!("{}/token", mock_server.uri()));
        let result = provider.access_token().await;

        match result {
            Err(GatewayError::Auth(msg)) => assert!(msg.contains("Token exchange failed")),
            other => panic!("Expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_file_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not valid json {{{").unwrap();

        let result = TokenProvider::from_file(
            Client::new(),
            "http://localhost/token".to_string(),
            &file.path().to_string_lossy(),
        )
        .await;

        match result {
            Err(GatewayError::Auth(msg)) => {
                assert!(msg.contains("Failed to parse service account JSON"))
            }
            other => panic!("Expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_file_invalid_key() {
        let sa_json = serde_json::json!({
            "project_id": "test-project",
            "private_key": "not-a-valid-pem-key",
            "client_email": "courier@test-project.iam.gserviceaccount.com"
        });
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(sa_json.to_string().as_bytes()).unwrap();

        let result = TokenProvider::from_file(
            Client::new(),
            "http://localhost/token".to_string(),
            &file.path().to_string_lossy(),
        )
        .await;

        match result {
            Err(GatewayError::Auth(msg)) => {
                assert!(msg.contains("Failed to parse service account key"))
            }
            other => panic!("Expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_file_missing_file() {
        let result = TokenProvider::from_file(
            Client::new(),
            "http://localhost/token".to_string(),
            "/nonexistent/service-account.json",
        )
        .await;

        match result {
            Err(GatewayError::Auth(msg)) => {
                assert!(msg.contains("Failed to read service account file"))
            }
            other => panic!("Expected auth error, got {other:?}"),
        }
    }
}
