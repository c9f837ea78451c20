//! Scheduled comment sweeps using tokio-cron-scheduler.
//!
//! Optional. Deployments normally trigger `/cron/poll-comments` from an
//! external scheduler; setting `SWEEP_CRON` runs the sweep in-process too.
//!
//! ```text
//! Scheduler (SWEEP_CRON)
//!     │
//!     └─► run_sweep()
//!             └─► For each due job → claim → poll → capture leads
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::polling::run_sweep;
use crate::kernel::ServerDeps;

/// Start the sweep scheduler on `cron` (six fields, seconds first).
pub async fn start_scheduler(deps: Arc<ServerDeps>, cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_deps = deps.clone();
    let sweep_job = Job::new_async(cron, move |_uuid, _lock| {
        let deps = sweep_deps.clone();
        Box::pin(async move {
            let summary = run_sweep(&deps).await;
            if !summary.errors.is_empty() {
                tracing::warn!(
                    errors = summary.errors.len(),
                    "Scheduled comment sweep finished with errors"
                );
            }
        })
    })
    .with_context(|| format!("invalid SWEEP_CRON expression: {}", cron))?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "Scheduled comment sweep started");
    Ok(scheduler)
}
