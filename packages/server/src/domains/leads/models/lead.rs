use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{CampaignId, LeadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    EmailCaptured,
    DmSent,
    ConnectionPending,
}

/// Source tag for leads created from trigger comments.
pub const COMMENT_TRIGGER_SOURCE: &str = "comment_trigger";

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub campaign_id: CampaignId,
    /// Commenter's platform id. Unique within a campaign.
    pub platform_id: String,
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub email: Option<String>,
    pub status: LeadStatus,
    pub source: String,
    /// Comment that produced (or last touched) this lead.
    pub comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when upserting a lead by (campaign_id, platform_id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub campaign_id: CampaignId,
    pub platform_id: String,
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub comment_id: String,
}

impl Lead {
    /// Lead as first inserted for `new`.
    pub fn from_new(new: &NewLead, now: DateTime<Utc>) -> Self {
        Self {
            id: LeadId::new(),
            campaign_id: new.campaign_id,
            platform_id: new.platform_id.clone(),
            name: new.name.clone(),
            profile_url: new.profile_url.clone(),
            email: None,
            status: LeadStatus::New,
            source: COMMENT_TRIGGER_SOURCE.to_string(),
            comment_id: Some(new.comment_id.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Lead {
    /// Insert or refresh by natural key. Status and email are never touched
    /// here; only the capture state machine advances them.
    pub async fn upsert(new: &NewLead, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO leads (id, campaign_id, platform_id, name, profile_url, status, source, comment_id)
            VALUES ($1, $2, $3, $4, $5, 'new', $6, $7)
            ON CONFLICT (campaign_id, platform_id) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, leads.name),
                profile_url = COALESCE(EXCLUDED.profile_url, leads.profile_url),
                comment_id = EXCLUDED.comment_id,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(LeadId::new())
        .bind(new.campaign_id)
        .bind(&new.platform_id)
        .bind(&new.name)
        .bind(&new.profile_url)
        .bind(COMMENT_TRIGGER_SOURCE)
        .bind(&new.comment_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Set status, and the email when one is given.
    pub async fn update_status(
        id: LeadId,
        status: LeadStatus,
        email: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE leads
            SET status = $2,
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_platform_id(
        campaign_id: CampaignId,
        platform_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM leads WHERE campaign_id = $1 AND platform_id = $2")
            .bind(campaign_id)
            .bind(platform_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
