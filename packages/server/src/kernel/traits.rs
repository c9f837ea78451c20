// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "which outreach does this commenter get") lives in
// domain activities that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseCommentGateway)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CampaignId, LeadId, ScrapeJobId};
use crate::domains::comments::models::{Comment, ProcessedComment};
use crate::domains::leads::models::{Lead, LeadStatus, NewLead, PendingConnection};
use crate::domains::scrape_jobs::models::{ClaimOutcome, ErrorTally, JobMetrics, ScrapeJob};
use crate::kernel::GatewayError;

// =============================================================================
// Comment Gateway Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseCommentGateway: Send + Sync {
    /// All comments on a post in platform order, following pagination up to
    /// the configured page cap. A later page failing yields a partial list;
    /// a first page failing is an error.
    async fn fetch_all_comments(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Vec<Comment>, GatewayError>;
}

// =============================================================================
// Connection Status Gateway Trait (Infrastructure)
// =============================================================================

/// Relationship between the campaign's account and a commenter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub has_pending_invitation: bool,
}

#[async_trait]
pub trait BaseConnectionGateway: Send + Sync {
    async fn check_connection_status(
        &self,
        account_id: &str,
        commenter_id: &str,
    ) -> Result<ConnectionStatus, GatewayError>;
}

// =============================================================================
// Outreach Gateway Trait (Infrastructure)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub invitation_id: Option<String>,
}

/// Each call is independent and best-effort.
#[async_trait]
pub trait BaseOutreachGateway: Send + Sync {
    async fn send_direct_message(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<(), GatewayError>;

    async fn reply_to_comment(
        &self,
        account_id: &str,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<(), GatewayError>;

    async fn send_connection_request(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<ConnectionRequest, GatewayError>;
}

// =============================================================================
// Email Extraction Trait (Infrastructure)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailConfidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailExtraction {
    pub email: Option<String>,
    pub confidence: EmailConfidence,
}

impl EmailExtraction {
    pub fn none() -> Self {
        Self {
            email: None,
            confidence: EmailConfidence::Low,
        }
    }

    /// The email, if it is trustworthy enough to act on.
    pub fn usable_email(&self) -> Option<&str> {
        match self.confidence {
            EmailConfidence::Medium | EmailConfidence::High => self.email.as_deref(),
            EmailConfidence::Low => None,
        }
    }
}

#[async_trait]
pub trait BaseEmailExtractor: Send + Sync {
    async fn extract_email(&self, text: &str) -> Result<EmailExtraction>;
}

// =============================================================================
// Engagement Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseEngagementStore: Send + Sync {
    // --- Scrape jobs ---

    /// Pollable jobs with `next_check_at` unset or at/before `now`.
    async fn find_due_candidates(&self, now: DateTime<Utc>) -> Result<Vec<ScrapeJob>>;

    /// Conditional write. Succeeds for `scheduled` jobs, and for `running`
    /// jobs last claimed before `stale_before`.
    async fn claim_job(
        &self,
        id: ScrapeJobId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<ClaimOutcome>;

    /// Conditional write. Applies only while the job is still `running` under
    /// the claim taken at `claimed_at`; returns whether it did.
    async fn complete_job(
        &self,
        id: ScrapeJobId,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_check_at: DateTime<Utc>,
        metrics: JobMetrics,
    ) -> Result<bool>;

    /// Atomic increment-and-return. Moves the job to `failed` when
    /// `disable_at` is set and the new count reaches it, otherwise releases
    /// the claim.
    async fn increment_error_count(
        &self,
        id: ScrapeJobId,
        error: &str,
        now: DateTime<Utc>,
        disable_at: Option<i32>,
    ) -> Result<ErrorTally>;

    // --- Dedup ledger ---

    async fn has_processed(&self, campaign_id: CampaignId, comment_id: &str) -> Result<bool>;

    /// Returns `true` when this call inserted the row.
    async fn mark_processed(&self, record: &ProcessedComment) -> Result<bool>;

    // --- Leads ---

    async fn upsert_lead(&self, lead: &NewLead) -> Result<Lead>;

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
        email: Option<&str>,
    ) -> Result<Lead>;

    // --- Pending connections ---

    async fn find_pending_connection(
        &self,
        campaign_id: CampaignId,
        commenter_id: &str,
    ) -> Result<Option<PendingConnection>>;

    async fn create_pending_connection(
        &self,
        connection: &PendingConnection,
    ) -> Result<PendingConnection>;
}
