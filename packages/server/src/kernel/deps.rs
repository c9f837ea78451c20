//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by every sweep.
//! All external services use trait abstractions to enable testing.

use async_trait::async_trait;
use std::sync::Arc;
use unipile_client::{PostComment, UnipileClient};

use crate::config::SweepSettings;
use crate::domains::comments::models::{Comment, CommentAuthor};
use crate::kernel::{
    BaseCommentGateway, BaseConnectionGateway, BaseEmailExtractor, BaseEngagementStore,
    BaseOutreachGateway, ConnectionRequest, ConnectionStatus, GatewayError,
};

// =============================================================================
// UnipileClient Adapter (implements the gateway traits)
// =============================================================================

/// Wrapper around UnipileClient that implements the comment, connection and
/// outreach gateway traits.
pub struct UnipileAdapter {
    client: Arc<UnipileClient>,
    max_comment_pages: u32,
}

impl UnipileAdapter {
    pub fn new(client: Arc<UnipileClient>, max_comment_pages: u32) -> Self {
        Self {
            client,
            max_comment_pages,
        }
    }
}

impl From<PostComment> for Comment {
    fn from(comment: PostComment) -> Self {
        let details = comment.author_details.unwrap_or_default();

        Comment {
            id: comment.id,
            author: CommentAuthor {
                id: details.id,
                name: details.name.or(comment.author),
                profile_url: details.profile_url,
            },
            text: comment.text,
        }
    }
}

#[async_trait]
impl BaseCommentGateway for UnipileAdapter {
    async fn fetch_all_comments(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Vec<Comment>, GatewayError> {
        let comments = self
            .client
            .fetch_all_comments(account_id, post_id, self.max_comment_pages)
            .await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl BaseConnectionGateway for UnipileAdapter {
    async fn check_connection_status(
        &self,
        account_id: &str,
        commenter_id: &str,
    ) -> Result<ConnectionStatus, GatewayError> {
        let profile = self.client.get_user_profile(account_id, commenter_id).await?;
        Ok(ConnectionStatus {
            is_connected: profile.is_connected(),
            has_pending_invitation: profile.has_pending_invitation(),
        })
    }
}

#[async_trait]
impl BaseOutreachGateway for UnipileAdapter {
    async fn send_direct_message(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.client
            .start_chat(account_id, commenter_id, text)
            .await
            .map(|_| ())
            .map_err(Into::into)
    }

    async fn reply_to_comment(
        &self,
        account_id: &str,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.client
            .reply_to_comment(account_id, post_id, comment_id, text)
            .await
            .map_err(Into::into)
    }

    async fn send_connection_request(
        &self,
        account_id: &str,
        commenter_id: &str,
        text: &str,
    ) -> Result<ConnectionRequest, GatewayError> {
        let sent = self
            .client
            .send_invitation(account_id, commenter_id, Some(text))
            .await?;
        Ok(ConnectionRequest {
            invitation_id: sent.invitation_id,
        })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseEngagementStore>,
    pub comment_gateway: Arc<dyn BaseCommentGateway>,
    pub connection_gateway: Arc<dyn BaseConnectionGateway>,
    pub outreach_gateway: Arc<dyn BaseOutreachGateway>,
    pub email_extractor: Arc<dyn BaseEmailExtractor>,
    pub settings: SweepSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        store: Arc<dyn BaseEngagementStore>,
        comment_gateway: Arc<dyn BaseCommentGateway>,
        connection_gateway: Arc<dyn BaseConnectionGateway>,
        outreach_gateway: Arc<dyn BaseOutreachGateway>,
        email_extractor: Arc<dyn BaseEmailExtractor>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            store,
            comment_gateway,
            connection_gateway,
            outreach_gateway,
            email_extractor,
            settings,
        }
    }

    /// Production wiring: one Unipile adapter serves all three gateways.
    pub fn with_unipile(
        store: Arc<dyn BaseEngagementStore>,
        client: Arc<UnipileClient>,
        email_extractor: Arc<dyn BaseEmailExtractor>,
        settings: SweepSettings,
    ) -> Self {
        let adapter = Arc::new(UnipileAdapter::new(client, settings.max_comment_pages));
        Self::new(
            store,
            adapter.clone(),
            adapter.clone(),
            adapter,
            email_extractor,
            settings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_comment_maps_author_details() {
        let raw: PostComment = serde_json::from_str(
            r#"{"id": "c1", "text": "guide please", "author": "Ada L.",
                "author_details": {"id": "ACoAA1", "profile_url": "https://linkedin.com/in/ada"}}"#,
        )
        .unwrap();

        let comment = Comment::from(raw);
        assert_eq!(comment.id, "c1");
        assert_eq!(comment.author_id(), Some("ACoAA1"));
        assert_eq!(comment.author.name.as_deref(), Some("Ada L."));
        assert_eq!(
            comment.author.profile_url.as_deref(),
            Some("https://linkedin.com/in/ada")
        );
    }

    #[test]
    fn post_comment_without_details_is_unresolved() {
        let raw: PostComment = serde_json::from_str(r#"{"id": "c2", "text": "guide"}"#).unwrap();
        let comment = Comment::from(raw);
        assert_eq!(comment.author_id(), None);
    }
}
