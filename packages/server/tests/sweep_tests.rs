//! End-to-end sweep behavior against mock gateways and the in-memory store.

mod common;

use chrono::{Duration, Utc};
use engagement_core::common::{CampaignId, ScrapeJobId};
use engagement_core::config::SweepSettings;
use engagement_core::domains::leads::models::{LeadStatus, PendingConnection};
use engagement_core::domains::polling::{run_sweep, SweepSummary};
use engagement_core::domains::scrape_jobs::models::{ScrapeJob, ScrapeJobStatus};
use engagement_core::kernel::test_dependencies::{
    InMemoryEngagementStore, MockCommentGateway, MockConnectionGateway, MockOutreachGateway,
};
use engagement_core::kernel::{GatewayError, TestDependencies};

use crate::common::{anonymous_comment, comment, due_job, job_for_campaign, ACCOUNT_ID};

const POST: &str = "urn:li:activity:7001";

fn store_with(jobs: &[ScrapeJob]) -> InMemoryEngagementStore {
    let store = InMemoryEngagementStore::new();
    for job in jobs {
        store.insert_job(job.clone());
    }
    store
}

/// Pull the job's next check into the past so the next sweep picks it up.
fn make_due(store: &InMemoryEngagementStore, id: ScrapeJobId) {
    let mut job = store.job(id).expect("job exists");
    job.next_check_at = Some(Utc::now() - Duration::minutes(1));
    store.update_job(job);
}

// =============================================================================
// Outreach branches
// =============================================================================

#[tokio::test]
async fn connected_commenter_gets_direct_message() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ada Lovelace", "Guide please!")],
        ))
        .mock_connections(MockConnectionGateway::new().connected("u1"));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.dms_queued, 1);
    assert!(summary.errors.is_empty());

    let dms = test.outreach.direct_messages();
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].account_id, ACCOUNT_ID);
    assert_eq!(dms[0].commenter_id, "u1");
    assert!(dms[0].text.contains("Ada"));
    assert!(test.outreach.connection_requests().is_empty());

    let lead = test.store.lead(job.campaign_id, "u1").unwrap();
    assert_eq!(lead.status, LeadStatus::DmSent);
    assert_eq!(lead.comment_id.as_deref(), Some("c1"));

    let processed = test.store.processed(job.campaign_id, "c1").unwrap();
    assert!(processed.dm_queued);
    assert_eq!(processed.matched_trigger.as_deref(), Some("guide"));

    let stored = test.store.job(job.id).unwrap();
    assert_eq!(stored.status, ScrapeJobStatus::Scheduled);
    assert_eq!(stored.comments_scanned, 1);
    assert_eq!(stored.triggers_found, 1);
    assert_eq!(stored.dms_sent, 1);
    assert!(stored.next_check_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn email_in_comment_is_captured_without_connection_lookup() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment(
                "c1",
                "u1",
                "Grace Hopper",
                "guide please, grace@hopper.dev",
            )],
        ));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.dms_queued, 1);
    let lead = test.store.lead(job.campaign_id, "u1").unwrap();
    assert_eq!(lead.status, LeadStatus::EmailCaptured);
    assert_eq!(lead.email.as_deref(), Some("grace@hopper.dev"));

    assert!(test.connections.calls().is_empty());
    assert!(test.outreach.direct_messages().is_empty());
    let replies = test.outreach.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].post_id, POST);
    assert_eq!(replies[0].comment_id, "c1");
}

#[tokio::test]
async fn stranger_gets_reply_and_invitation() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Linus", "guide")],
        ));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.dms_queued, 0);
    assert_eq!(test.outreach.replies().len(), 1);
    let requests = test.outreach.connection_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].text.chars().count() <= 300);

    let pending = test.store.pending_connections();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].commenter_id, "u1");
    assert_eq!(pending[0].invitation_id.as_deref(), Some("inv-1"));

    let lead = test.store.lead(job.campaign_id, "u1").unwrap();
    assert_eq!(lead.status, LeadStatus::ConnectionPending);

    let processed = test.store.processed(job.campaign_id, "c1").unwrap();
    assert!(!processed.dm_queued);
    assert_eq!(processed.matched_trigger.as_deref(), Some("guide"));

    let stored = test.store.job(job.id).unwrap();
    assert_eq!(stored.triggers_found, 1);
    assert_eq!(stored.dms_sent, 0);
}

#[tokio::test]
async fn outstanding_invitation_means_no_new_outreach() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ken", "guide")],
        ))
        .mock_connections(MockConnectionGateway::new().with_pending_invitation("u1"));

    run_sweep(&test.deps()).await;

    assert_eq!(test.outreach.total_actions(), 0);
    assert!(test.store.processed(job.campaign_id, "c1").is_some());
    assert_eq!(
        test.store.lead(job.campaign_id, "u1").unwrap().status,
        LeadStatus::New
    );
}

#[tokio::test]
async fn locally_recorded_invitation_blocks_second_request() {
    let job = due_job(POST, "guide");
    let store = store_with(&[job.clone()]);
    store.add_pending_connection(PendingConnection::new(
        job.campaign_id,
        "u1",
        "earlier-comment",
        Some("inv-old".to_string()),
    ));

    let test = TestDependencies::new()
        .store(store)
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ken", "guide")],
        ));

    run_sweep(&test.deps()).await;

    assert!(test.outreach.connection_requests().is_empty());
    assert!(test.outreach.replies().is_empty());
    assert_eq!(test.store.pending_connections().len(), 1);
}

#[tokio::test]
async fn failed_direct_message_is_recorded_and_not_retried() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ada", "guide")],
        ))
        .mock_connections(MockConnectionGateway::new().connected("u1"))
        .mock_outreach(
            MockOutreachGateway::new().failing_dms(GatewayError::RateLimited("slow".into())),
        );

    let summary = run_sweep(&test.deps()).await;
    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.dms_queued, 0);

    let processed = test.store.processed(job.campaign_id, "c1").unwrap();
    assert!(!processed.dm_queued);
    assert_eq!(processed.matched_trigger.as_deref(), Some("guide"));
    assert_eq!(
        test.store.lead(job.campaign_id, "u1").unwrap().status,
        LeadStatus::New
    );

    make_due(&test.store, job.id);
    run_sweep(&test.deps()).await;
    assert_eq!(test.outreach.direct_messages().len(), 1);
}

#[tokio::test]
async fn non_matching_comment_is_ledgered_without_lead() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ada", "Great post, thanks for sharing")],
        ));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 1);
    let processed = test.store.processed(job.campaign_id, "c1").unwrap();
    assert!(!processed.dm_queued);
    assert_eq!(processed.matched_trigger, None);
    assert!(test.store.leads().is_empty());
    assert_eq!(test.outreach.total_actions(), 0);
    assert_eq!(test.store.job(job.id).unwrap().triggers_found, 0);
}

#[tokio::test]
async fn misspelled_trigger_still_matches() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![comment("c1", "u1", "Ada", "Gude please!")],
        ))
        .mock_connections(MockConnectionGateway::new().connected("u1"));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.dms_queued, 1);
    assert_eq!(
        test.store
            .processed(job.campaign_id, "c1")
            .unwrap()
            .matched_trigger
            .as_deref(),
        Some("guide")
    );
}

// =============================================================================
// Idempotency
// =============================================================================

#[tokio::test]
async fn repeated_sweeps_never_contact_twice() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![
                comment("c1", "u1", "Ada", "guide"),
                comment("c2", "u2", "Grace", "guide"),
                comment("c3", "u3", "Ken", "nice"),
            ],
        ))
        .mock_connections(MockConnectionGateway::new().connected("u1"));

    run_sweep(&test.deps()).await;
    let actions_after_first = test.outreach.total_actions();
    assert_eq!(test.store.processed_comments().len(), 3);

    make_due(&test.store, job.id);
    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.dms_queued, 0);
    assert_eq!(test.outreach.total_actions(), actions_after_first);
    assert_eq!(test.store.processed_comments().len(), 3);
    assert_eq!(test.comments.call_count(), 2);

    let stored = test.store.job(job.id).unwrap();
    assert_eq!(stored.comments_scanned, 6);
    assert_eq!(stored.triggers_found, 2);

    // Exactly one lead transition per triggering commenter across both sweeps
    let ada = test.store.lead(job.campaign_id, "u1").expect("lead for u1");
    let grace = test.store.lead(job.campaign_id, "u2").expect("lead for u2");
    assert_eq!(
        test.store.lead_transitions(),
        vec![
            (ada.id, LeadStatus::DmSent),
            (grace.id, LeadStatus::ConnectionPending),
        ]
    );
    assert!(test.store.lead(job.campaign_id, "u3").is_none());
}

#[tokio::test]
async fn same_commenter_on_two_posts_gets_one_invitation() {
    let campaign_id = CampaignId::new();
    let first = job_for_campaign(campaign_id, "post-a", "guide");
    let second = job_for_campaign(campaign_id, "post-b", "guide");

    let test = TestDependencies::new()
        .store(store_with(&[first.clone(), second.clone()]))
        .mock_comments(
            MockCommentGateway::new()
                .with_comments("post-a", vec![comment("ca", "u1", "Ada", "guide")])
                .with_comments("post-b", vec![comment("cb", "u1", "Ada", "guide")]),
        );

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 2);
    assert_eq!(test.outreach.connection_requests().len(), 1);
    assert_eq!(test.store.leads().len(), 1);
    assert!(test.store.processed(campaign_id, "ca").is_some());
    assert!(test.store.processed(campaign_id, "cb").is_some());
}

#[tokio::test]
async fn unresolved_author_is_retried_once_resolved() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(
            MockCommentGateway::new()
                .with_comments(POST, vec![anonymous_comment("c1", "guide please")]),
        )
        .mock_connections(MockConnectionGateway::new().connected("u1"));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 1);
    assert!(summary.errors.is_empty());
    assert!(test.store.processed(job.campaign_id, "c1").is_none());
    assert!(test.store.leads().is_empty());
    assert_eq!(test.outreach.total_actions(), 0);

    test.comments
        .set_comments(POST, vec![comment("c1", "u1", "Ada", "guide please")]);
    make_due(&test.store, job.id);
    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.dms_queued, 1);
    assert!(test.store.processed(job.campaign_id, "c1").unwrap().dm_queued);
}

#[tokio::test]
async fn connection_lookup_failure_leaves_comment_for_next_sweep() {
    let job = due_job(POST, "guide");
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(MockCommentGateway::new().with_comments(
            POST,
            vec![
                comment("c1", "u1", "Ada", "guide"),
                comment("c2", "u2", "Grace", "guide"),
            ],
        ))
        .mock_connections(
            MockConnectionGateway::new()
                .with_failure("u1", GatewayError::Network("reset".into()))
                .connected("u2"),
        );

    let summary = run_sweep(&test.deps()).await;

    // The job itself succeeded; only one comment was deferred
    assert_eq!(summary.jobs_processed, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(summary.dms_queued, 1);
    assert!(test.store.processed(job.campaign_id, "c1").is_none());
    assert!(test.store.processed(job.campaign_id, "c2").is_some());
    assert_eq!(test.store.job(job.id).unwrap().error_count, 0);
}

// =============================================================================
// Job lifecycle
// =============================================================================

#[tokio::test]
async fn incomplete_jobs_are_skipped_and_untouched() {
    let campaign_id = CampaignId::new();
    let no_post = ScrapeJob::builder()
        .campaign_id(campaign_id)
        .account_id(ACCOUNT_ID)
        .trigger_word("guide")
        .build();
    let blank_trigger = ScrapeJob::builder()
        .campaign_id(campaign_id)
        .post_id(POST)
        .account_id(ACCOUNT_ID)
        .trigger_word("   ")
        .build();

    let test = TestDependencies::new().store(store_with(&[no_post.clone(), blank_trigger.clone()]));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 0);
    assert_eq!(summary.jobs_skipped, 2);
    assert!(summary.errors.is_empty());
    assert_eq!(test.comments.call_count(), 0);

    for id in [no_post.id, blank_trigger.id] {
        let stored = test.store.job(id).unwrap();
        assert_eq!(stored.status, ScrapeJobStatus::Scheduled);
        assert_eq!(stored.error_count, 0);
        assert_eq!(stored.last_checked_at, None);
    }
}

#[tokio::test]
async fn third_not_found_disables_job() {
    let mut job = due_job(POST, "guide");
    job.error_count = 2;
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(
            MockCommentGateway::new()
                .with_failure(POST, GatewayError::NotFound("post deleted".into())),
        );

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 0);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains(&job.id.to_string()));

    let stored = test.store.job(job.id).unwrap();
    assert_eq!(stored.status, ScrapeJobStatus::Failed);
    assert_eq!(stored.error_count, 3);

    let summary = run_sweep(&test.deps()).await;
    assert_eq!(summary, SweepSummary::default());
    assert_eq!(test.comments.call_count(), 1);
}

#[tokio::test]
async fn transient_failure_keeps_job_scheduled() {
    let mut job = due_job(POST, "guide");
    job.error_count = 7;
    let test = TestDependencies::new()
        .store(store_with(&[job.clone()]))
        .mock_comments(
            MockCommentGateway::new()
                .with_failure(POST, GatewayError::RateLimited("429".into())),
        );

    let summary = run_sweep(&test.deps()).await;
    assert_eq!(summary.errors.len(), 1);

    let stored = test.store.job(job.id).unwrap();
    assert_eq!(stored.status, ScrapeJobStatus::Scheduled);
    assert_eq!(stored.error_count, 8);
    assert!(stored.last_error.unwrap().contains("429"));

    // Still due, so the next sweep retries and a success resets the count
    test.comments.clear_failure(POST);
    let summary = run_sweep(&test.deps()).await;
    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(test.store.job(job.id).unwrap().error_count, 0);
}

#[tokio::test]
async fn job_claimed_elsewhere_is_skipped() {
    let mut job = due_job(POST, "guide");
    job.status = ScrapeJobStatus::Running;
    job.last_checked_at = Some(Utc::now());
    let test = TestDependencies::new().store(store_with(&[job.clone()]));

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_skipped, 1);
    assert_eq!(summary.jobs_processed, 0);
    assert_eq!(test.comments.call_count(), 0);
}

#[tokio::test]
async fn one_failing_job_does_not_stop_the_others() {
    let healthy: Vec<ScrapeJob> = (0..5)
        .map(|i| due_job(&format!("post-{i}"), "guide"))
        .collect();
    let broken = due_job("post-broken", "guide");

    let mut gateway = MockCommentGateway::new()
        .with_failure("post-broken", GatewayError::Unknown("boom".into()));
    for (i, job) in healthy.iter().enumerate() {
        gateway = gateway.with_comments(
            job.post_id.as_deref().unwrap(),
            vec![comment(&format!("c{i}"), &format!("u{i}"), "Ada", "guide")],
        );
    }

    let mut all = healthy.clone();
    all.push(broken.clone());

    let test = TestDependencies::new()
        .store(store_with(&all))
        .mock_comments(gateway)
        .settings(SweepSettings {
            concurrency: 4,
            ..SweepSettings::default()
        });

    let summary = run_sweep(&test.deps()).await;

    assert_eq!(summary.jobs_processed, 5);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(test.comments.call_count(), 6);
    assert_eq!(test.outreach.connection_requests().len(), 5);
    for job in &healthy {
        assert_eq!(
            test.store.job(job.id).unwrap().status,
            ScrapeJobStatus::Scheduled
        );
    }
    assert_eq!(test.store.job(broken.id).unwrap().error_count, 1);
}
