use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::CampaignId;

/// Dedup ledger entry. One row per (campaign, comment), never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedComment {
    pub campaign_id: CampaignId,
    pub comment_id: String,
    pub dm_queued: bool,
    pub matched_trigger: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedComment {
    pub fn new(
        campaign_id: CampaignId,
        comment_id: impl Into<String>,
        dm_queued: bool,
        matched_trigger: Option<String>,
    ) -> Self {
        Self {
            campaign_id,
            comment_id: comment_id.into(),
            dm_queued,
            matched_trigger,
            processed_at: Utc::now(),
        }
    }

    /// Comment seen but not a trigger match.
    pub fn unmatched(campaign_id: CampaignId, comment_id: impl Into<String>) -> Self {
        Self::new(campaign_id, comment_id, false, None)
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl ProcessedComment {
    pub async fn exists(campaign_id: CampaignId, comment_id: &str, pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM processed_comments WHERE campaign_id = $1 AND comment_id = $2
             )",
        )
        .bind(campaign_id)
        .bind(comment_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert unless the (campaign, comment) row already exists.
    /// Returns `true` only when this call created the row.
    pub async fn insert_if_absent(&self, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO processed_comments (campaign_id, comment_id, dm_queued, matched_trigger, processed_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (campaign_id, comment_id) DO NOTHING",
        )
        .bind(self.campaign_id)
        .bind(&self.comment_id)
        .bind(self.dm_queued)
        .bind(&self.matched_trigger)
        .bind(self.processed_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find(
        campaign_id: CampaignId,
        comment_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT campaign_id, comment_id, dm_queued, matched_trigger, processed_at
             FROM processed_comments WHERE campaign_id = $1 AND comment_id = $2",
        )
        .bind(campaign_id)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
