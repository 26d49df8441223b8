use thiserror::Error;

/// Errors produced while talking to the push gateway.
///
/// Every variant is batch-scoped: the dispatcher captures these as
/// failure results for the affected batch rather than propagating them
/// out of the invocation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport error (connect, TLS, request deadline).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    /// OAuth2 credential or token-exchange failure.
    #[error("Auth error: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT assertion signing error.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// IO error (service-account file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch request exceeded its deadline.
    #[error("Batch request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_status() {
        let err = GatewayError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway returned 503: unavailable");
    }

    #[test]
    fn test_error_display_auth() {
        let err = GatewayError::Auth("token exchange failed".to_string());
        assert_eq!(err.to_string(), "Auth error: token exchange failed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatewayError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
