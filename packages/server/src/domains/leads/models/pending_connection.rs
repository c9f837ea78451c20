use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{CampaignId, PendingConnectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "pending_connection_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PendingConnectionStatus {
    #[default]
    Pending,
}

/// An invitation sent to a commenter who was not yet connected. Kept so the
/// same commenter is never invited twice and so acceptance can be matched
/// back to the comment later.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct PendingConnection {
    pub id: PendingConnectionId,
    pub campaign_id: CampaignId,
    pub commenter_id: String,
    pub comment_id: String,
    pub invitation_id: Option<String>,
    pub status: PendingConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl PendingConnection {
    pub fn new(
        campaign_id: CampaignId,
        commenter_id: impl Into<String>,
        comment_id: impl Into<String>,
        invitation_id: Option<String>,
    ) -> Self {
        Self {
            id: PendingConnectionId::new(),
            campaign_id,
            commenter_id: commenter_id.into(),
            comment_id: comment_id.into(),
            invitation_id,
            status: PendingConnectionStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl PendingConnection {
    pub async fn create(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO pending_connections (id, campaign_id, commenter_id, comment_id, invitation_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.campaign_id)
        .bind(&self.commenter_id)
        .bind(&self.comment_id)
        .bind(&self.invitation_id)
        .bind(self.status)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_pending(
        campaign_id: CampaignId,
        commenter_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM pending_connections
            WHERE campaign_id = $1 AND commenter_id = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .bind(commenter_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
