use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Cron endpoint authentication middleware
///
/// When a secret is configured, the request must carry
/// `Authorization: Bearer <secret>`. Without a secret the endpoint is open.
pub async fn cron_auth_middleware(
    secret: Option<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(secret) = secret else {
        return next.run(request).await;
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if bearer_matches(header, &secret) {
        next.run(request).await
    } else {
        warn!(path = %request.uri().path(), "Rejected cron request with missing or wrong secret");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response()
    }
}

fn bearer_matches(header: Option<&str>, secret: &str) -> bool {
    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        return false;
    };
    let token = token.trim().as_bytes();
    let secret = secret.as_bytes();

    // Length leaks, contents don't
    token.len() == secret.len()
        && token
            .iter()
            .zip(secret)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
