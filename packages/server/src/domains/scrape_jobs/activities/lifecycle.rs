//! Job lifecycle: claim, reschedule on success, count errors on failure.
//!
//! ```text
//!            claim                      success
//! scheduled ───────► running ──────────────────────► scheduled (+interval, errors = 0)
//!     ▲                 │
//!     │   transient     │ failure: errors += 1
//!     └─────────────────┤
//!                       │ fatal && errors >= 3
//!                       └──────────────────────────► failed (terminal)
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::domains::scrape_jobs::models::{ClaimOutcome, DueJob, JobMetrics, ScrapeJobStatus};
use crate::kernel::{classify, FailureKind, ServerDeps};

/// Error count at which a fatal failure disables a job.
pub const FATAL_ERROR_THRESHOLD: i32 = 3;

/// What happened to a job after a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub kind: FailureKind,
    pub error_count: i32,
    /// The job was moved to `failed` and will not be polled again.
    pub disabled: bool,
}

pub async fn claim(job: &DueJob, now: DateTime<Utc>, deps: &ServerDeps) -> Result<ClaimOutcome> {
    let stale_before = now - deps.settings.claim_lease;
    let outcome = deps
        .store
        .claim_job(job.id, now, stale_before)
        .await
        .with_context(|| format!("claiming scrape job {}", job.id))?;

    if outcome == ClaimOutcome::AlreadyClaimed {
        tracing::debug!(job_id = %job.id, "Scrape job already claimed by another sweep");
    }

    Ok(outcome)
}

/// When the job should next be polled.
pub fn next_check_at(
    now: DateTime<Utc>,
    poll_interval_minutes: Option<i32>,
    default_interval: Duration,
) -> DateTime<Utc> {
    let interval = poll_interval_minutes
        .filter(|minutes| *minutes > 0)
        .map(|minutes| Duration::minutes(minutes.into()))
        .unwrap_or(default_interval);
    now + interval
}

/// running -> scheduled. Adds metrics and resets the error count.
///
/// Returns the next check time, or `None` when the claim taken at
/// `claimed_at` was lost to another sweep and nothing was written.
pub async fn record_success(
    job: &DueJob,
    metrics: JobMetrics,
    claimed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Option<DateTime<Utc>>> {
    let next = next_check_at(
        now,
        job.poll_interval_minutes,
        deps.settings.default_poll_interval,
    );

    let applied = deps
        .store
        .complete_job(job.id, claimed_at, now, next, metrics)
        .await
        .with_context(|| format!("completing scrape job {}", job.id))?;

    if !applied {
        tracing::warn!(
            job_id = %job.id,
            claimed_at = %claimed_at,
            "Scrape job claim lost before completion, results not recorded"
        );
        return Ok(None);
    }

    tracing::info!(
        job_id = %job.id,
        campaign_id = %job.campaign_id,
        comments_scanned = metrics.comments_scanned,
        triggers_found = metrics.triggers_found,
        dms_sent = metrics.dms_sent,
        next_check_at = %next,
        "Scrape job completed"
    );

    Ok(Some(next))
}

/// Count the failure and disable the job if the error is fatal and has
/// repeated often enough. Both happen in one store write.
pub async fn record_failure(
    job: &DueJob,
    error: &anyhow::Error,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<FailureOutcome> {
    let kind = classify(error);
    let message = format!("{:#}", error);
    let disable_at = kind.is_fatal().then_some(FATAL_ERROR_THRESHOLD);

    let tally = deps
        .store
        .increment_error_count(job.id, &message, now, disable_at)
        .await
        .with_context(|| format!("recording failure for scrape job {}", job.id))?;

    let error_count = tally.error_count;
    let disabled = tally.status == ScrapeJobStatus::Failed;

    if disabled {
        tracing::error!(
            job_id = %job.id,
            campaign_id = %job.campaign_id,
            post_id = %job.post_id,
            error_count,
            kind = %kind,
            error = %message,
            "Scrape job disabled, target no longer available"
        );
    } else {
        tracing::warn!(
            job_id = %job.id,
            campaign_id = %job.campaign_id,
            error_count,
            kind = %kind,
            error = %message,
            "Scrape job failed, will retry next sweep"
        );
    }

    Ok(FailureOutcome {
        kind,
        error_count,
        disabled,
    })
}
