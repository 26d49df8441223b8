//! Liveness and readiness endpoints.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router, extract::State};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

/// Liveness response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
}

/// Readiness response.
#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: String,
    database: bool,
}

/// Serve `/health` and `/ready` until the process is terminated.
pub async fn serve(bind_address: &str, pool: PgPool) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(pool)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!(address = %bind_address, "Health server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Liveness check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check handler: verifies the registry database is reachable.
async fn ready_handler(State(pool): State<PgPool>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1").execute(&pool).await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if database { "ready" } else { "degraded" }.to_string(),
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler_reports_ok() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

