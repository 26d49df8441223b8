//! CrewCourier worker binary entrypoint.
//!
//! Consumes message-created events from the Redis queue and runs one
//! fan-out pipeline invocation per event. All shared clients (Postgres
//! pool, Redis connection, push gateway) are constructed once here and
//! passed into the pipeline by reference.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use courier_common::config::AppConfig;
use courier_common::db::create_pool;
use courier_common::redis_pool::create_redis_conn;
use courier_gateway::{GatewayConfig, HttpPushGateway};
use courier_pipeline::FanoutPipeline;
use courier_pipeline::registry::PgTokenRegistry;

mod health;
mod queue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("courier_worker=debug,courier_pipeline=debug,courier_gateway=debug")
        }))
        .init();

    tracing::info!("Starting CrewCourier worker...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config).await?;
    tracing::info!("Database pool created");

    // Create Redis connection for the event queue
    let redis = create_redis_conn(&config).await?;
    tracing::info!("Redis connection established");

    // Push gateway client, constructed once and reused across invocations
    let dispatch_timeout = Duration::from_secs(config.dispatch_timeout_secs);
    let gateway = Arc::new(
        HttpPushGateway::new(GatewayConfig {
            send_url: config.push_gateway_url.clone(),
            oauth_token_url: config.push_oauth_token_url.clone(),
            service_account_path: config.push_service_account_path.clone(),
            request_timeout: dispatch_timeout,
        })
        .await?,
    );
    tracing::info!("Push gateway client ready");

    let registry = Arc::new(PgTokenRegistry::new(pool.clone()));
    let pipeline = FanoutPipeline::new(
        registry,
        gateway,
        config.dispatch_concurrency,
        dispatch_timeout,
    );

    // Health server runs alongside the consumer
    let health_bind = config.health_bind_address.clone();
    let health_pool = pool.clone();
    tokio::spawn(async move {
        if let Err(e) = health::serve(&health_bind, health_pool).await {
            tracing::error!(error = %e, "Health server exited");
        }
    });

    let mut consumer = queue::QueueConsumer::new(redis, config.message_queue_key.clone());
    consumer.run(&pipeline).await
}
