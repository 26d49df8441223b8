use redis::Client;
use redis::aio::ConnectionManager;

use crate::config::AppConfig;

/// Create the Redis connection manager for the message event queue.
pub async fn create_redis_conn(config: &AppConfig) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(config.redis_url.as_str())?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!("Connected to Redis");
    Ok(manager)
}
