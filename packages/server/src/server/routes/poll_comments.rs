use axum::{extract::Extension, Json};

use crate::domains::polling::{run_sweep, SweepSummary};
use crate::server::app::AppState;

/// Run one comment sweep and report what it did
///
/// Always 200: job failures are reported in `errors`, never as an HTTP error.
pub async fn poll_comments_handler(Extension(state): Extension<AppState>) -> Json<SweepSummary> {
    tracing::info!("Comment sweep requested over HTTP");
    Json(run_sweep(&state.deps).await)
}
