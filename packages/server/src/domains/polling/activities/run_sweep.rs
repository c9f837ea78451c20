//! One sweep across every due scrape job.
//!
//! ```text
//! find_due_candidates(now)
//!     └─► drop validation gaps (logged, never claimed)
//!             └─► process_job per job (buffer_unordered(concurrency))
//!                     └─► fold into SweepSummary
//! ```
//!
//! The sweep itself never fails. Job errors end up in `SweepSummary::errors`.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::process_job::{process_job, JobRun};
use crate::domains::scrape_jobs::models::{DueJob, ScrapeJob};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    /// Jobs polled to completion.
    pub jobs_processed: usize,
    pub dms_queued: usize,
    /// Jobs claimed elsewhere plus jobs missing target fields.
    pub jobs_skipped: usize,
    pub errors: Vec<String>,
}

pub async fn run_sweep(deps: &ServerDeps) -> SweepSummary {
    let started = Instant::now();
    let mut summary = SweepSummary::default();

    let candidates = match deps.store.find_due_candidates(Utc::now()).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!(error = %e, "Failed to select due scrape jobs");
            summary.errors.push(format!("selecting due jobs: {:#}", e));
            return summary;
        }
    };

    let (jobs, gaps) = select_due_jobs(candidates);
    summary.jobs_skipped += gaps;

    if jobs.is_empty() {
        tracing::debug!(validation_gaps = gaps, "No scrape jobs due");
        return summary;
    }

    tracing::info!(
        due = jobs.len(),
        validation_gaps = gaps,
        concurrency = deps.settings.concurrency,
        "Starting comment sweep"
    );

    let results: Vec<(DueJob, anyhow::Result<JobRun>)> = stream::iter(jobs)
        .map(|job| async move {
            let result = process_job(&job, deps).await;
            (job, result)
        })
        .buffer_unordered(deps.settings.concurrency.max(1))
        .collect()
        .await;

    for (job, result) in results {
        match result {
            Ok(JobRun::Completed(report)) => {
                summary.jobs_processed += 1;
                summary.dms_queued += report.metrics.dms_sent as usize;
            }
            Ok(JobRun::Skipped) => summary.jobs_skipped += 1,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    campaign_id = %job.campaign_id,
                    error = %format!("{:#}", e),
                    "Scrape job failed"
                );
                summary.errors.push(format!("job {}: {:#}", job.id, e));
            }
        }
    }

    tracing::info!(
        jobs_processed = summary.jobs_processed,
        dms_queued = summary.dms_queued,
        jobs_skipped = summary.jobs_skipped,
        errors = summary.errors.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Comment sweep finished"
    );

    summary
}

/// Split candidates into pollable jobs and a count of validation gaps.
/// Gaps are logged and left untouched.
pub fn select_due_jobs(candidates: Vec<ScrapeJob>) -> (Vec<DueJob>, usize) {
    let mut jobs = Vec::with_capacity(candidates.len());
    let mut gaps = 0;

    for candidate in candidates {
        match candidate.due_job() {
            Ok(job) => jobs.push(job),
            Err(gap) => {
                gaps += 1;
                tracing::warn!(
                    job_id = %gap.job_id,
                    campaign_id = %candidate.campaign_id,
                    missing = ?gap.missing,
                    "Skipping scrape job with missing target fields"
                );
            }
        }
    }

    (jobs, gaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CampaignId;

    #[test]
    fn summary_serializes_camel_case() {
        let summary = SweepSummary {
            jobs_processed: 2,
            dms_queued: 1,
            jobs_skipped: 0,
            errors: vec!["job x: boom".into()],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["jobsProcessed"], 2);
        assert_eq!(json["dmsQueued"], 1);
        assert_eq!(json["jobsSkipped"], 0);
        assert_eq!(json["errors"][0], "job x: boom");
    }

    #[test]
    fn gaps_are_filtered_and_counted() {
        let campaign_id = CampaignId::new();
        let complete = ScrapeJob::builder()
            .campaign_id(campaign_id)
            .post_id("p1")
            .account_id("a1")
            .trigger_word("guide")
            .build();
        let no_trigger = ScrapeJob::builder()
            .campaign_id(campaign_id)
            .post_id("p2")
            .account_id("a1")
            .build();

        let (jobs, gaps) = select_due_jobs(vec![complete.clone(), no_trigger]);
        assert_eq!(gaps, 1);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, complete.id);
    }
}
