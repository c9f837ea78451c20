// TestDependencies - mock implementations for testing
//
// Provides mock gateways and an in-memory store that can be injected into
// ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{
    BaseCommentGateway, BaseConnectionGateway, BaseEmailExtractor, BaseEngagementStore,
    BaseOutreachGateway, ConnectionRequest, ConnectionStatus, GatewayError, RegexEmailExtractor,
    ServerDeps,
};
use crate::common::{CampaignId, LeadId, ScrapeJobId};
use crate::config::SweepSettings;
use crate::domains::comments::models::{Comment, ProcessedComment};
use crate::domains::leads::models::{Lead, LeadStatus, NewLead, PendingConnection};
use crate::domains::scrape_jobs::models::{
    ClaimOutcome, ErrorTally, JobMetrics, ScrapeJob, ScrapeJobStatus,
};

// =============================================================================
// Mock Comment Gateway
// =============================================================================

pub struct MockCommentGateway {
    comments: Arc<Mutex<HashMap<String, Vec<Comment>>>>,
    failures: Arc<Mutex<HashMap<String, GatewayError>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockCommentGateway {
    pub fn new() -> Self {
        Self {
            comments: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Comments returned for `post_id` on every fetch
    pub fn with_comments(self, post_id: &str, comments: Vec<Comment>) -> Self {
        self.set_comments(post_id, comments);
        self
    }

    /// Fail every fetch for `post_id`
    pub fn with_failure(self, post_id: &str, error: GatewayError) -> Self {
        self.set_failure(post_id, error);
        self
    }

    /// Replace the comments for a post mid-test (e.g. new comments arriving)
    pub fn set_comments(&self, post_id: &str, comments: Vec<Comment>) {
        self.comments
            .lock()
            .unwrap()
            .insert(post_id.to_string(), comments);
    }

    pub fn set_failure(&self, post_id: &str, error: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .insert(post_id.to_string(), error);
    }

    pub fn clear_failure(&self, post_id: &str) {
        self.failures.lock().unwrap().remove(post_id);
    }

    /// (account_id, post_id) for every fetch
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockCommentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCommentGateway for MockCommentGateway {
    async fn fetch_all_comments(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Vec<Comment>, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((account_id.to_string(), post_id.to_string()));

        if let Some(error) = self.failures.lock().unwrap().get(post_id) {
            return Err(error.clone());
        }

        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Connection Gateway
// =============================================================================

pub struct MockConnectionGateway {
    statuses: Arc<Mutex<HashMap<String, ConnectionStatus>>>,
    failures: Arc<Mutex<HashMap<String, GatewayError>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockConnectionGateway {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_status(self, commenter_id: &str, status: ConnectionStatus) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(commenter_id.to_string(), status);
        self
    }

    pub fn connected(self, commenter_id: &str) -> Self {
        self.with_status(
            commenter_id,
            ConnectionStatus {
                is_connected: true,
                has_pending_invitation: false,
            },
        )
    }

    pub fn with_pending_invitation(self, commenter_id: &str) -> Self {
        self.with_status(
            commenter_id,
            ConnectionStatus {
                is_connected: false,
                has_pending_invitation: true,
            },
        )
    }

    pub fn with_failure(self, commenter_id: &str, error: GatewayError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(commenter_id.to_string(), error);
        self
    }

    /// Commenter ids that were looked up
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockConnectionGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseConnectionGateway for MockConnectionGateway {
    async fn check_connection_status(
        &self,
        _account_id: &str,
        commenter_id: &str,
    ) -> Result<ConnectionStatus, GatewayError> {
        self.calls.lock().unwrap().push(commenter_id.to_string());

        if let Some(error) = self.failures.lock().unwrap().get(commenter_id) {
            return Err(error.clone());
        }

        // Unknown commenters are strangers with no invitation outstanding
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(commenter_id)
            .copied()
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Outreach Gateway
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessageCall {
    pub account_id: String,
    pub commenter_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReplyCall {
    pub account_id: String,
    pub post_id: String,
    pub comment_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequestCall {
    pub account_id: String,
    pub commenter_id: String,
    pub text: String,
}

pub struct MockOutreachGateway {
    direct_messages: Arc<Mutex<Vec<DirectMessageCall>>>,
    replies: Arc<Mutex<Vec<CommentReplyCall>>>,
    connection_requests: Arc<Mutex<Vec<ConnectionRequestCall>>>,
    dm_failure: Option<GatewayError>,
    reply_failure: Option<GatewayError>,
    invitation_failure: Option<GatewayError>,
}

impl MockOutreachGateway {
    pub fn new() -> Self {
        Self {
            direct_messages: Arc::new(Mutex::new(Vec::new())),
            replies: Arc::new(Mutex::new(Vec::new())),
            connection_requests: Arc::new(Mutex::new(Vec::new())),
            dm_failure: None,
            reply_failure: None,
            invitation_failure: None,
        }
    }

    /// Every direct message attempt fails (the attempt is still recorded)
    pub fn failing_dms(mut self, error: GatewayError) -> Self {
        self.dm_failure = Some(error);
        self
    }

    pub fn failing_replies(mut self, error: GatewayError) -> Self {
        self.reply_failure = Some(error);
        self
    }

    pub fn failing_invitations(mut self, error: GatewayError) -> Self {
        self.invitation_failure = Some(error);
        self
    }

    pub fn direct_messages(&self) -> Vec<DirectMessageCall> {
        self.direct_messages.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<CommentReplyCall> {
        self.replies.lock().unwrap().clone()
    }

    pub fn connection_requests(&self) -> Vec<ConnectionRequestCall> {
        self.connection_requests.lock().unwrap().clone()
    }

    /// Total outreach attempts of any kind
    pub fn total_actions(&self) -> usize {
        self.direct_messages.lock().unwrap().len()
            + self.replies.lock().unwrap().len()
            + self.connection_requests.lock().unwrap().len()
    }
}

impl Default for MockOutreachGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOutreachGateway for MockOutreachGateway {
    async fn send_direct_message(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.direct_messages.lock().unwrap().push(DirectMessageCall {
            account_id: account_id.to_string(),
            commenter_id: commenter_id.to_string(),
            text: text.to_string(),
        });

        match &self.dm_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn reply_to_comment(
        &self,
        account_id: &str,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.replies.lock().unwrap().push(CommentReplyCall {
            account_id: account_id.to_string(),
            post_id: post_id.to_string(),
            comment_id: comment_id.to_string(),
            text: text.to_string(),
        });

        match &self.reply_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn send_connection_request(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<ConnectionRequest, GatewayError> {
        let mut requests = self.connection_requests.lock().unwrap();
        requests.push(ConnectionRequestCall {
            account_id: account_id.to_string(),
            commenter_id: commenter_id.to_string(),
            text: text.to_string(),
        });

        match &self.invitation_failure {
            Some(error) => Err(error.clone()),
            None => Ok(ConnectionRequest {
                invitation_id: Some(format!("inv-{}", requests.len())),
            }),
        }
    }
}

// =============================================================================
// In-Memory Engagement Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    jobs: Vec<ScrapeJob>,
    processed: Vec<ProcessedComment>,
    leads: Vec<Lead>,
    pending_connections: Vec<PendingConnection>,
    lead_transitions: Vec<(LeadId, LeadStatus)>,
}

/// Store with the same write semantics as the Postgres one: conditional
/// claims, atomic error counts, and unique keys on the ledger and leads.
pub struct InMemoryEngagementStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    pub fn with_job(self, job: ScrapeJob) -> Self {
        self.insert_job(job);
        self
    }

    pub fn insert_job(&self, job: ScrapeJob) {
        self.state.lock().unwrap().jobs.push(job);
    }

    pub fn job(&self, id: ScrapeJobId) -> Option<ScrapeJob> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|job| job.id == id)
            .cloned()
    }

    /// Overwrite a stored job (e.g. to simulate a stale claim)
    pub fn update_job(&self, job: ScrapeJob) {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.jobs.iter_mut().find(|j| j.id == job.id) {
            *existing = job;
        }
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.state.lock().unwrap().leads.clone()
    }

    pub fn lead(&self, campaign_id: CampaignId, platform_id: &str) -> Option<Lead> {
        self.state
            .lock()
            .unwrap()
            .leads
            .iter()
            .find(|lead| lead.campaign_id == campaign_id && lead.platform_id == platform_id)
            .cloned()
    }

    /// Every status change applied to any lead, in order
    pub fn lead_transitions(&self) -> Vec<(LeadId, LeadStatus)> {
        self.state.lock().unwrap().lead_transitions.clone()
    }

    pub fn processed_comments(&self) -> Vec<ProcessedComment> {
        self.state.lock().unwrap().processed.clone()
    }

    pub fn processed(&self, campaign_id: CampaignId, comment_id: &str) -> Option<ProcessedComment> {
        self.state
            .lock()
            .unwrap()
            .processed
            .iter()
            .find(|p| p.campaign_id == campaign_id && p.comment_id == comment_id)
            .cloned()
    }

    pub fn pending_connections(&self) -> Vec<PendingConnection> {
        self.state.lock().unwrap().pending_connections.clone()
    }

    pub fn add_pending_connection(&self, connection: PendingConnection) {
        self.state
            .lock()
            .unwrap()
            .pending_connections
            .push(connection);
    }
}

impl Default for InMemoryEngagementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    fn job_mut(&mut self, id: ScrapeJobId) -> Result<&mut ScrapeJob> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| anyhow!("scrape job {} not found", id))
    }
}

#[async_trait]
impl BaseEngagementStore for InMemoryEngagementStore {
    async fn find_due_candidates(&self, now: DateTime<Utc>) -> Result<Vec<ScrapeJob>> {
        let state = self.state.lock().unwrap();
        let mut due: Vec<ScrapeJob> = state
            .jobs
            .iter()
            .filter(|job| job.is_due(now))
            .cloned()
            .collect();
        // NULLS FIRST, then oldest
        due.sort_by_key(|job| (job.next_check_at.is_some(), job.next_check_at, job.created_at));
        Ok(due)
    }

    async fn claim_job(
        &self,
        id: ScrapeJobId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let mut state = self.state.lock().unwrap();
        let job = state.job_mut(id)?;

        let claimable = match job.status {
            ScrapeJobStatus::Scheduled => true,
            ScrapeJobStatus::Running => job.last_checked_at.map_or(true, |at| at < stale_before),
            ScrapeJobStatus::Failed => false,
        };
        if !claimable {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        job.status = ScrapeJobStatus::Running;
        job.last_checked_at = Some(now);
        job.updated_at = now;
        Ok(ClaimOutcome::Claimed)
    }

    async fn complete_job(
        &self,
        id: ScrapeJobId,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_check_at: DateTime<Utc>,
        metrics: JobMetrics,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let job = state.job_mut(id)?;
        if job.status != ScrapeJobStatus::Running || job.last_checked_at != Some(claimed_at) {
            return Ok(false);
        }

        job.status = ScrapeJobStatus::Scheduled;
        job.error_count = 0;
        job.next_check_at = Some(next_check_at);
        job.comments_scanned += metrics.comments_scanned;
        job.triggers_found += metrics.triggers_found;
        job.dms_sent += metrics.dms_sent;
        job.updated_at = now;
        Ok(true)
    }

    async fn increment_error_count(
        &self,
        id: ScrapeJobId,
        error: &str,
        now: DateTime<Utc>,
        disable_at: Option<i32>,
    ) -> Result<ErrorTally> {
        let mut state = self.state.lock().unwrap();
        let job = state.job_mut(id)?;

        job.error_count += 1;
        job.last_error = Some(error.to_string());
        job.last_error_at = Some(now);
        if disable_at.is_some_and(|threshold| job.error_count >= threshold) {
            job.status = ScrapeJobStatus::Failed;
        } else if job.status == ScrapeJobStatus::Running {
            job.status = ScrapeJobStatus::Scheduled;
        }
        job.updated_at = now;
        Ok(ErrorTally {
            error_count: job.error_count,
            status: job.status,
        })
    }

    async fn has_processed(&self, campaign_id: CampaignId, comment_id: &str) -> Result<bool> {
        Ok(self.processed(campaign_id, comment_id).is_some())
    }

    async fn mark_processed(&self, record: &ProcessedComment) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .processed
            .iter()
            .any(|p| p.campaign_id == record.campaign_id && p.comment_id == record.comment_id);
        if exists {
            return Ok(false);
        }
        state.processed.push(record.clone());
        Ok(true)
    }

    async fn upsert_lead(&self, new: &NewLead) -> Result<Lead> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = state
            .leads
            .iter_mut()
            .find(|l| l.campaign_id == new.campaign_id && l.platform_id == new.platform_id)
        {
            if new.name.is_some() {
                existing.name = new.name.clone();
            }
            if new.profile_url.is_some() {
                existing.profile_url = new.profile_url.clone();
            }
            existing.comment_id = Some(new.comment_id.clone());
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let lead = Lead::from_new(new, now);
        state.leads.push(lead.clone());
        Ok(lead)
    }

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
        email: Option<&str>,
    ) -> Result<Lead> {
        let mut state = self.state.lock().unwrap();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| anyhow!("lead {} not found", id))?;

        lead.status = status;
        if let Some(email) = email {
            lead.email = Some(email.to_string());
        }
        lead.updated_at = Utc::now();
        let updated = lead.clone();

        state.lead_transitions.push((id, status));
        Ok(updated)
    }

    async fn find_pending_connection(
        &self,
        campaign_id: CampaignId,
        commenter_id: &str,
    ) -> Result<Option<PendingConnection>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pending_connections
            .iter()
            .find(|c| c.campaign_id == campaign_id && c.commenter_id == commenter_id)
            .cloned())
    }

    async fn create_pending_connection(
        &self,
        connection: &PendingConnection,
    ) -> Result<PendingConnection> {
        self.add_pending_connection(connection.clone());
        Ok(connection.clone())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub store: Arc<InMemoryEngagementStore>,
    pub comments: Arc<MockCommentGateway>,
    pub connections: Arc<MockConnectionGateway>,
    pub outreach: Arc<MockOutreachGateway>,
    pub email_extractor: Arc<dyn BaseEmailExtractor>,
    pub settings: SweepSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryEngagementStore::new()),
            comments: Arc::new(MockCommentGateway::new()),
            connections: Arc::new(MockConnectionGateway::new()),
            outreach: Arc::new(MockOutreachGateway::new()),
            email_extractor: Arc::new(RegexEmailExtractor::new()),
            settings: SweepSettings::default(),
        }
    }

    /// Set the in-memory store
    pub fn store(mut self, store: InMemoryEngagementStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Set a mock comment gateway
    pub fn mock_comments(mut self, gateway: MockCommentGateway) -> Self {
        self.comments = Arc::new(gateway);
        self
    }

    /// Set a mock connection gateway
    pub fn mock_connections(mut self, gateway: MockConnectionGateway) -> Self {
        self.connections = Arc::new(gateway);
        self
    }

    /// Set a mock outreach gateway
    pub fn mock_outreach(mut self, gateway: MockOutreachGateway) -> Self {
        self.outreach = Arc::new(gateway);
        self
    }

    pub fn email_extractor(mut self, extractor: Arc<dyn BaseEmailExtractor>) -> Self {
        self.email_extractor = extractor;
        self
    }

    pub fn settings(mut self, settings: SweepSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build ServerDeps sharing these mocks, so calls stay inspectable
    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.comments.clone(),
            self.connections.clone(),
            self.outreach.clone(),
            self.email_extractor.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
