use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<JobCounts>,
    pub pool: PoolStats,
}

/// Snapshot of the scrape job table.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    /// Would be picked up by a sweep right now.
    pub due: i64,
    pub running: i64,
    pub failed: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
    pub max: u32,
}

/// 200 when the database answers within 5s, 503 otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let pool = PoolStats {
        size: state.db_pool.size(),
        idle: state.db_pool.num_idle(),
        max: state.db_pool.options().get_max_connections(),
    };

    let (jobs, error) = match tokio::time::timeout(DB_CHECK_TIMEOUT, job_counts(&state.db_pool)).await
    {
        Ok(Ok(counts)) => (Some(counts), None),
        Ok(Err(e)) => (None, Some(format!("database query failed: {}", e))),
        Err(_) => (None, Some("database query timed out".to_string())),
    };

    if let Some(error) = &error {
        tracing::warn!(error = %error, "Health check failed");
    }

    let healthy = error.is_none();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            healthy,
            error,
            jobs,
            pool,
        }),
    )
}

async fn job_counts(pool: &PgPool) -> sqlx::Result<JobCounts> {
    sqlx::query_as::<_, JobCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (
                WHERE status IN ('scheduled', 'running')
                  AND (next_check_at IS NULL OR next_check_at <= NOW())
            ) AS due,
            COUNT(*) FILTER (WHERE status = 'running') AS running,
            COUNT(*) FILTER (WHERE status = 'failed') AS failed
        FROM scrape_jobs
        "#,
    )
    .fetch_one(pool)
    .await
}
