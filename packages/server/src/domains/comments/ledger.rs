//! Dedup ledger: the durable record of which comments a campaign has handled.
//!
//! The storage layer's unique key on (campaign_id, comment_id) is what keeps
//! outreach idempotent. `has_processed` only saves work; `mark_processed`
//! reports whether this caller actually won the row.

use anyhow::{Context, Result};

use crate::common::CampaignId;
use crate::domains::comments::models::ProcessedComment;
use crate::kernel::BaseEngagementStore;

pub struct DedupLedger<'a> {
    store: &'a dyn BaseEngagementStore,
}

impl<'a> DedupLedger<'a> {
    pub fn new(store: &'a dyn BaseEngagementStore) -> Self {
        Self { store }
    }

    pub async fn has_processed(&self, campaign_id: CampaignId, comment_id: &str) -> Result<bool> {
        self.store
            .has_processed(campaign_id, comment_id)
            .await
            .with_context(|| format!("checking dedup ledger for comment {}", comment_id))
    }

    pub async fn mark_processed(
        &self,
        campaign_id: CampaignId,
        comment_id: &str,
        dm_queued: bool,
        matched_trigger: Option<&str>,
    ) -> Result<bool> {
        let record = ProcessedComment::new(
            campaign_id,
            comment_id,
            dm_queued,
            matched_trigger.map(str::to_string),
        );

        let inserted = self
            .store
            .mark_processed(&record)
            .await
            .with_context(|| format!("writing dedup ledger for comment {}", comment_id))?;

        if !inserted {
            tracing::debug!(
                campaign_id = %campaign_id,
                comment_id,
                "Comment already in dedup ledger, another sweep got there first"
            );
        }

        Ok(inserted)
    }
}
