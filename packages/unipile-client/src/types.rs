use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Post comments ---

/// One page of `GET /posts/{post_id}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub items: Vec<PostComment>,
    pub cursor: Option<String>,
}

/// A single comment on a post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostComment {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Display name of the commenter.
    pub author: Option<String>,
    pub author_details: Option<CommentAuthor>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentAuthor {
    pub id: Option<String>,
    pub name: Option<String>,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
}

// --- Profiles / relationship state ---

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub provider_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// e.g. `FIRST_DEGREE`, `SECOND_DEGREE`, `OUT_OF_NETWORK`.
    pub network_distance: Option<String>,
    pub invitation: Option<ProfileInvitation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInvitation {
    #[serde(rename = "type")]
    pub invitation_type: Option<String>,
    pub status: Option<String>,
}

impl UserProfile {
    pub fn is_connected(&self) -> bool {
        matches!(
            self.network_distance.as_deref(),
            Some("FIRST_DEGREE") | Some("DISTANCE_1")
        )
    }

    pub fn has_pending_invitation(&self) -> bool {
        self.invitation
            .as_ref()
            .and_then(|inv| inv.status.as_deref())
            .is_some_and(|status| status.eq_ignore_ascii_case("PENDING"))
    }
}

// --- Outreach requests ---

#[derive(Debug, Clone, Serialize)]
pub struct StartChatInput {
    pub account_id: String,
    pub attendees_ids: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatStarted {
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentReplyInput {
    pub account_id: String,
    pub text: String,
    /// Parent comment being replied to.
    pub comment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationInput {
    pub provider_id: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationSent {
    pub invitation_id: Option<String>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub status: Option<u16>,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
}
