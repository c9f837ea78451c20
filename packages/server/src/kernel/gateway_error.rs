//! Gateway error normalization and failure classification.
//!
//! Every call to the social platform passes through this module on the way
//! back. Whatever shape the failure arrived in (an HTTP status, a status
//! string, a JSON error body, a transport error, a timeout) it leaves as a
//! [`GatewayError`]. Job bookkeeping then only ever asks one question of an
//! error: what [`FailureKind`] is it?
//!
//! ```text
//! UnipileError::Api { status: 404, .. }  ─┐
//! {"status": "not_found"}                ─┼─► GatewayError::NotFound ─► FailureKind::NotFound (fatal)
//! reqwest timeout / Elapsed              ─┴─► GatewayError::Timeout  ─► FailureKind::Network
//! sqlx::Error (not a gateway error)      ───────────────────────────► FailureKind::Unknown
//! ```

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use unipile_client::UnipileError;

/// Closed set of failures a gateway call can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("gateway error: {0}")]
    Unknown(String),
}

/// Classification used by job bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    RateLimited,
    Network,
    Unknown,
}

impl FailureKind {
    /// Only a vanished resource stops polling for good.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailureKind::NotFound)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Network => "network",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::NotFound(_) => FailureKind::NotFound,
            GatewayError::RateLimited(_) => FailureKind::RateLimited,
            GatewayError::Network(_) | GatewayError::Timeout(_) => FailureKind::Network,
            GatewayError::Unknown(_) => FailureKind::Unknown,
        }
    }

    /// Normalize a numeric HTTP-style status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 | 410 => GatewayError::NotFound(message),
            429 => GatewayError::RateLimited(message),
            408 | 502 | 503 | 504 => GatewayError::Network(message),
            _ => GatewayError::Unknown(format!("status {}: {}", status, message)),
        }
    }

    /// Normalize a status reported as a string ("404", "not_found",
    /// "errors/resource_not_found", "TOO_MANY_REQUESTS", ...).
    pub fn from_status_text(status: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let trimmed = status.trim();

        if let Ok(code) = trimmed.parse::<u16>() {
            return Self::from_status(code, message);
        }

        let normalized = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
        if normalized.contains("not_found") || normalized.contains("notfound") {
            GatewayError::NotFound(message)
        } else if normalized.contains("rate_limit")
            || normalized.contains("too_many_requests")
            || normalized.contains("throttl")
        {
            GatewayError::RateLimited(message)
        } else if normalized.contains("timeout")
            || normalized.contains("timed_out")
            || normalized.contains("network")
            || normalized.contains("unavailable")
            || normalized.contains("econnreset")
        {
            GatewayError::Network(message)
        } else {
            GatewayError::Unknown(format!("{}: {}", trimmed, message))
        }
    }

    /// Normalize a JSON error response. The status may sit at the top level or
    /// nested under `error`, as a number or a string. Falls back to
    /// `http_status` when the body carries none.
    pub fn from_response_body(http_status: u16, body: &Value) -> Self {
        let scope = body.get("error").filter(|e| e.is_object()).unwrap_or(body);

        let message = ["detail", "message", "title"]
            .iter()
            .find_map(|key| scope.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        match scope.get("status").or_else(|| scope.get("code")) {
            Some(Value::Number(n)) => match n.as_u64().and_then(|n| u16::try_from(n).ok()) {
                Some(code) => Self::from_status(code, message),
                None => Self::from_status(http_status, message),
            },
            Some(Value::String(s)) => Self::from_status_text(s, message),
            _ => match scope.get("type").and_then(Value::as_str) {
                Some(kind) => match Self::from_status_text(kind, message.clone()) {
                    GatewayError::Unknown(_) => Self::from_status(http_status, message),
                    known => known,
                },
                None => Self::from_status(http_status, message),
            },
        }
    }
}

impl From<UnipileError> for GatewayError {
    fn from(err: UnipileError) -> Self {
        match err {
            UnipileError::Api { status, message } => {
                match serde_json::from_str::<Value>(&message) {
                    Ok(body @ Value::Object(_)) => Self::from_response_body(status, &body),
                    _ => Self::from_status(status, message),
                }
            }
            UnipileError::Timeout(message) => GatewayError::Network(message),
            UnipileError::Network(message) => GatewayError::Network(message),
            UnipileError::Parse(message) => GatewayError::Unknown(message),
        }
    }
}

impl From<tokio::time::error::Elapsed> for GatewayError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        GatewayError::Network(err.to_string())
    }
}

/// Classify any error that reached the job boundary.
///
/// Walks the context chain so `GatewayError`s wrapped with `.context(...)`
/// are still recognized. Anything else (storage, parsing) is `Unknown`.
pub fn classify(error: &anyhow::Error) -> FailureKind {
    for cause in error.chain() {
        if let Some(gateway) = cause.downcast_ref::<GatewayError>() {
            return gateway.kind();
        }
        if let Some(unipile) = cause.downcast_ref::<UnipileError>() {
            return GatewayError::from(unipile.clone()).kind();
        }
        if cause.is::<tokio::time::error::Elapsed>() {
            return FailureKind::Network;
        }
    }
    FailureKind::Unknown
}

/// Run a gateway call under a timeout. Expiry becomes `GatewayError::Timeout`.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(timeout)),
    }
}
