//! Builders for jobs and comments shared by the integration tests.

use engagement_core::common::CampaignId;
use engagement_core::domains::comments::models::{Comment, CommentAuthor};
use engagement_core::domains::scrape_jobs::models::ScrapeJob;

pub const ACCOUNT_ID: &str = "acc_test";

/// A complete, never-polled job for `post_id` with trigger word `trigger`.
pub fn due_job(post_id: &str, trigger: &str) -> ScrapeJob {
    ScrapeJob::builder()
        .campaign_id(CampaignId::new())
        .post_id(post_id)
        .account_id(ACCOUNT_ID)
        .trigger_word(trigger)
        .build()
}

pub fn job_for_campaign(campaign_id: CampaignId, post_id: &str, trigger: &str) -> ScrapeJob {
    ScrapeJob::builder()
        .campaign_id(campaign_id)
        .post_id(post_id)
        .account_id(ACCOUNT_ID)
        .trigger_word(trigger)
        .build()
}

pub fn comment(id: &str, author_id: &str, name: &str, text: &str) -> Comment {
    Comment::new(id, CommentAuthor::new(author_id, name), text)
}

pub fn anonymous_comment(id: &str, text: &str) -> Comment {
    Comment::new(id, CommentAuthor::unresolved(), text)
}
