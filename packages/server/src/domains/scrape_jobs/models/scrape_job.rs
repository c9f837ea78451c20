//! Monitored post model.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::common::{CampaignId, ScrapeJobId};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "scrape_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScrapeJobStatus {
    #[default]
    Scheduled,
    Running,
    /// Terminal. Only a manual reset brings the job back.
    Failed,
}

impl ScrapeJobStatus {
    /// Statuses that may appear in a sweep's due-set.
    pub fn is_pollable(&self) -> bool {
        matches!(self, ScrapeJobStatus::Scheduled | ScrapeJobStatus::Running)
    }
}

/// Result of the conditional claim write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyClaimed,
}

// ============================================================================
// ScrapeJob Model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ScrapeJob {
    #[builder(default = ScrapeJobId::new())]
    pub id: ScrapeJobId,
    pub campaign_id: CampaignId,

    // Target (all three required before the job is ever polled)
    #[builder(default, setter(strip_option))]
    pub post_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub account_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub trigger_word: Option<String>,

    // State
    #[builder(default)]
    pub status: ScrapeJobStatus,
    #[builder(default = 0)]
    pub error_count: i32,
    #[builder(default, setter(strip_option))]
    pub last_error: Option<String>,
    #[builder(default, setter(strip_option))]
    pub last_error_at: Option<DateTime<Utc>>,

    // Scheduling
    #[builder(default, setter(strip_option))]
    pub last_checked_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub next_check_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub poll_interval_minutes: Option<i32>,

    // Metrics
    #[builder(default = 0)]
    pub comments_scanned: i64,
    #[builder(default = 0)]
    pub triggers_found: i64,
    #[builder(default = 0)]
    pub dms_sent: i64,

    // Timestamps
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

/// A job whose target fields are all present. Only these are ever polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueJob {
    pub id: ScrapeJobId,
    pub campaign_id: CampaignId,
    pub post_id: String,
    pub account_id: String,
    pub trigger_word: String,
    pub poll_interval_minutes: Option<i32>,
}

/// A job row that cannot be polled because target fields are missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scrape job {job_id} is missing {}", .missing.join(", "))]
pub struct ValidationGap {
    pub job_id: ScrapeJobId,
    pub missing: Vec<&'static str>,
}

/// Row state right after a failure was counted.
#[derive(FromRow, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTally {
    pub error_count: i32,
    pub status: ScrapeJobStatus,
}

/// Counters added to a job after a successful poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobMetrics {
    pub comments_scanned: i64,
    pub triggers_found: i64,
    pub dms_sent: i64,
}

impl ScrapeJob {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pollable() && self.next_check_at.map_or(true, |at| at <= now)
    }

    /// Validate target fields. Blank strings count as missing.
    pub fn due_job(&self) -> Result<DueJob, ValidationGap> {
        fn present(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let post_id = present(&self.post_id);
        let account_id = present(&self.account_id);
        let trigger_word = present(&self.trigger_word);

        match (post_id, account_id, trigger_word) {
            (Some(post_id), Some(account_id), Some(trigger_word)) => Ok(DueJob {
                id: self.id,
                campaign_id: self.campaign_id,
                post_id,
                account_id,
                trigger_word,
                poll_interval_minutes: self.poll_interval_minutes,
            }),
            (post_id, account_id, trigger_word) => {
                let missing = [
                    ("post_id", post_id.is_none()),
                    ("account_id", account_id.is_none()),
                    ("trigger_word", trigger_word.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, is_missing)| is_missing.then_some(field))
                .collect();

                Err(ValidationGap {
                    job_id: self.id,
                    missing,
                })
            }
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl ScrapeJob {
    pub async fn find_by_id(id: ScrapeJobId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM scrape_jobs WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Rows whose status and schedule make them due. Target-field validation
    /// happens afterwards so gaps can be logged.
    pub async fn find_due_candidates(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM scrape_jobs
            WHERE status IN ('scheduled', 'running')
              AND (next_check_at IS NULL OR next_check_at <= $1)
            ORDER BY next_check_at ASC NULLS FIRST, created_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO scrape_jobs (
                id, campaign_id, post_id, account_id, trigger_word,
                status, error_count, last_error, last_error_at,
                last_checked_at, next_check_at, poll_interval_minutes,
                comments_scanned, triggers_found, dms_sent,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.campaign_id)
        .bind(&self.post_id)
        .bind(&self.account_id)
        .bind(&self.trigger_word)
        .bind(self.status)
        .bind(self.error_count)
        .bind(&self.last_error)
        .bind(self.last_error_at)
        .bind(self.last_checked_at)
        .bind(self.next_check_at)
        .bind(self.poll_interval_minutes)
        .bind(self.comments_scanned)
        .bind(self.triggers_found)
        .bind(self.dms_sent)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Conditional claim: scheduled -> running. A `running` job whose
    /// `last_checked_at` is older than `stale_before` is claimable too.
    pub async fn claim(
        id: ScrapeJobId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<ClaimOutcome> {
        let claimed = sqlx::query_scalar::<_, ScrapeJobId>(
            r#"
            UPDATE scrape_jobs
            SET status = 'running',
                last_checked_at = $2,
                updated_at = $2
            WHERE id = $1
              AND (
                  status = 'scheduled'
                  OR (status = 'running' AND (last_checked_at IS NULL OR last_checked_at < $3))
              )
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(stale_before)
        .fetch_optional(pool)
        .await?;

        Ok(match claimed {
            Some(_) => ClaimOutcome::Claimed,
            None => ClaimOutcome::AlreadyClaimed,
        })
    }

    /// running -> scheduled after a successful poll. Resets `error_count`.
    ///
    /// Only applies while the claim taken at `claimed_at` is still held, so a
    /// sweep whose lease expired and was reclaimed writes nothing. Returns
    /// whether the row was updated.
    pub async fn complete(
        id: ScrapeJobId,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_check_at: DateTime<Utc>,
        metrics: JobMetrics,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scrape_jobs
            SET status = 'scheduled',
                error_count = 0,
                next_check_at = $4,
                comments_scanned = comments_scanned + $5,
                triggers_found = triggers_found + $6,
                dms_sent = dms_sent + $7,
                updated_at = $3
            WHERE id = $1
              AND status = 'running'
              AND last_checked_at = $2
            "#,
        )
        .bind(id)
        .bind(claimed_at)
        .bind(now)
        .bind(next_check_at)
        .bind(metrics.comments_scanned)
        .bind(metrics.triggers_found)
        .bind(metrics.dms_sent)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomic increment-and-return. Records the error and, in the same
    /// statement, either disables the job (when `disable_at` is set and the
    /// new count reaches it) or releases the claim so the next sweep retries.
    /// `next_check_at` is left alone.
    pub async fn increment_error_count(
        id: ScrapeJobId,
        error: &str,
        now: DateTime<Utc>,
        disable_at: Option<i32>,
        pool: &PgPool,
    ) -> Result<ErrorTally> {
        sqlx::query_as::<_, ErrorTally>(
            r#"
            UPDATE scrape_jobs
            SET error_count = error_count + 1,
                last_error = $2,
                last_error_at = $3,
                status = CASE
                    WHEN $4::INT IS NOT NULL AND error_count + 1 >= $4::INT
                        THEN 'failed'::scrape_job_status
                    WHEN status = 'running' THEN 'scheduled'::scrape_job_status
                    ELSE status
                END,
                updated_at = $3
            WHERE id = $1
            RETURNING error_count, status
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .bind(disable_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
