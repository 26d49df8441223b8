use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string (token registry)
    pub database_url: String,

    /// Redis connection string (message-created event queue)
    pub redis_url: String,

    /// Redis list key the chat backend pushes message-created events onto
    pub message_queue_key: String,

    /// Multicast send endpoint of the push gateway
    pub push_gateway_url: String,

    /// Path to the gateway service-account JSON credentials
    pub push_service_account_path: String,

    /// OAuth2 token endpoint used to exchange the service-account assertion
    pub push_oauth_token_url: String,

    /// Maximum concurrent in-flight batch requests (default: 8)
    pub dispatch_concurrency: usize,

    /// Per-batch request deadline in seconds (default: 10)
    pub dispatch_timeout_secs: u64,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Bind address for the liveness/readiness HTTP server
    pub health_bind_address: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            message_queue_key: std::env::var("MESSAGE_QUEUE_KEY")
                .unwrap_or_else(|_| "chat:messages:created".to_string()),
            push_gateway_url: std::env::var("PUSH_GATEWAY_URL").map_err(|_| {
                anyhow::anyhow!("PUSH_GATEWAY_URL environment variable is required")
            })?,
            push_service_account_path: std::env::var("PUSH_SERVICE_ACCOUNT_PATH").map_err(
                |_| anyhow::anyhow!("PUSH_SERVICE_ACCOUNT_PATH environment variable is required"),
            )?,
            push_oauth_token_url: std::env::var("PUSH_OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            dispatch_concurrency: std::env::var("DISPATCH_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_CONCURRENCY must be a valid usize"))?,
            dispatch_timeout_secs: std::env::var("DISPATCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_TIMEOUT_SECS must be a valid u64"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            health_bind_address: std::env::var("HEALTH_BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
