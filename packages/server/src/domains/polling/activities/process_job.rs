use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domains::comments::models::Comment;
use crate::domains::comments::{match_trigger, DedupLedger};
use crate::domains::leads::activities::{capture_lead, CaptureOutcome};
use crate::domains::scrape_jobs::activities::{claim, record_failure, record_success};
use crate::domains::scrape_jobs::models::{ClaimOutcome, DueJob, JobMetrics};
use crate::kernel::{bounded, ServerDeps};

/// What one comment amounted to this sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    AlreadyProcessed,
    NoMatch,
    Captured(CaptureOutcome),
    /// Matched, but the author is not resolved yet. Left out of the ledger.
    Deferred,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub metrics: JobMetrics,
    /// Comments whose handling errored. They stay out of the ledger and are
    /// picked up again next sweep.
    pub comment_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRun {
    Completed(JobReport),
    /// Another sweep holds the claim.
    Skipped,
}

/// Claim and poll one job. Any error after the claim is counted against the
/// job before being returned.
pub async fn process_job(job: &DueJob, deps: &ServerDeps) -> Result<JobRun> {
    let claimed_at = Utc::now();
    if claim(job, claimed_at, deps).await? == ClaimOutcome::AlreadyClaimed {
        return Ok(JobRun::Skipped);
    }

    match poll_claimed_job(job, claimed_at, deps).await {
        Ok(report) => Ok(JobRun::Completed(report)),
        Err(error) => {
            if let Err(bookkeeping) = record_failure(job, &error, Utc::now(), deps).await {
                tracing::error!(
                    job_id = %job.id,
                    error = %bookkeeping,
                    "Failed to record scrape job failure"
                );
            }
            Err(error)
        }
    }
}

async fn poll_claimed_job(
    job: &DueJob,
    claimed_at: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<JobReport> {
    let comments = bounded(
        deps.settings.gateway_timeout,
        deps.comment_gateway
            .fetch_all_comments(&job.account_id, &job.post_id),
    )
    .await
    .with_context(|| format!("fetching comments for post {}", job.post_id))?;

    tracing::debug!(
        job_id = %job.id,
        post_id = %job.post_id,
        count = comments.len(),
        "Fetched comments"
    );

    let ledger = DedupLedger::new(deps.store.as_ref());
    let mut report = JobReport {
        metrics: JobMetrics {
            comments_scanned: comments.len() as i64,
            ..JobMetrics::default()
        },
        comment_errors: 0,
    };

    // Gateway order, one at a time
    for comment in &comments {
        match process_comment(job, comment, &ledger, deps).await {
            Ok(CommentOutcome::Captured(outcome)) => {
                report.metrics.triggers_found += 1;
                if outcome.dm_queued() {
                    report.metrics.dms_sent += 1;
                }
            }
            Ok(_) => {}
            Err(e) => {
                report.comment_errors += 1;
                tracing::warn!(
                    job_id = %job.id,
                    comment_id = %comment.id,
                    error = %format!("{:#}", e),
                    "Failed to process comment, will retry next sweep"
                );
            }
        }
    }

    record_success(job, report.metrics, claimed_at, Utc::now(), deps).await?;
    Ok(report)
}

/// Dedup check, trigger match, lead capture, ledger write.
pub async fn process_comment(
    job: &DueJob,
    comment: &Comment,
    ledger: &DedupLedger<'_>,
    deps: &ServerDeps,
) -> Result<CommentOutcome> {
    if ledger.has_processed(job.campaign_id, &comment.id).await? {
        return Ok(CommentOutcome::AlreadyProcessed);
    }

    let Some(matched) = match_trigger(&comment.text, &job.trigger_word) else {
        ledger
            .mark_processed(job.campaign_id, &comment.id, false, None)
            .await?;
        return Ok(CommentOutcome::NoMatch);
    };

    let outcome = capture_lead(job, comment, &matched, deps).await?;
    if !outcome.is_final() {
        return Ok(CommentOutcome::Deferred);
    }

    ledger
        .mark_processed(
            job.campaign_id,
            &comment.id,
            outcome.dm_queued(),
            Some(&matched),
        )
        .await?;

    Ok(CommentOutcome::Captured(outcome))
}
