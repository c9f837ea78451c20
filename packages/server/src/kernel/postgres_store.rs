//! Postgres-backed engagement store. Delegates to the model query functions.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{CampaignId, LeadId, ScrapeJobId};
use crate::domains::comments::models::ProcessedComment;
use crate::domains::leads::models::{Lead, LeadStatus, NewLead, PendingConnection};
use crate::domains::scrape_jobs::models::{ClaimOutcome, ErrorTally, JobMetrics, ScrapeJob};
use crate::kernel::BaseEngagementStore;

#[derive(Clone)]
pub struct PostgresEngagementStore {
    pool: PgPool,
}

impl PostgresEngagementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseEngagementStore for PostgresEngagementStore {
    async fn find_due_candidates(&self, now: DateTime<Utc>) -> Result<Vec<ScrapeJob>> {
        ScrapeJob::find_due_candidates(now, &self.pool).await
    }

    async fn claim_job(
        &self,
        id: ScrapeJobId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        ScrapeJob::claim(id, now, stale_before, &self.pool).await
    }

    async fn complete_job(
        &self,
        id: ScrapeJobId,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_check_at: DateTime<Utc>,
        metrics: JobMetrics,
    ) -> Result<bool> {
        ScrapeJob::complete(id, claimed_at, now, next_check_at, metrics, &self.pool).await
    }

    async fn increment_error_count(
        &self,
        id: ScrapeJobId,
        error: &str,
        now: DateTime<Utc>,
        disable_at: Option<i32>,
    ) -> Result<ErrorTally> {
        ScrapeJob::increment_error_count(id, error, now, disable_at, &self.pool).await
    }

    async fn has_processed(&self, campaign_id: CampaignId, comment_id: &str) -> Result<bool> {
        ProcessedComment::exists(campaign_id, comment_id, &self.pool).await
    }

    async fn mark_processed(&self, record: &ProcessedComment) -> Result<bool> {
        record.insert_if_absent(&self.pool).await
    }

    async fn upsert_lead(&self, lead: &NewLead) -> Result<Lead> {
        Lead::upsert(lead, &self.pool).await
    }

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
        email: Option<&str>,
    ) -> Result<Lead> {
        Lead::update_status(id, status, email, &self.pool).await
    }

    async fn find_pending_connection(
        &self,
        campaign_id: CampaignId,
        commenter_id: &str,
    ) -> Result<Option<PendingConnection>> {
        PendingConnection::find_pending(campaign_id, commenter_id, &self.pool).await
    }

    async fn create_pending_connection(
        &self,
        connection: &PendingConnection,
    ) -> Result<PendingConnection> {
        connection.create(&self.pool).await
    }
}
