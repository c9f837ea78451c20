//! Pure Unipile REST API client.
//!
//! A minimal client for the Unipile social-account API. Supports listing post
//! comments (cursor-paginated), reading a user's relationship state, and the
//! three outreach actions: direct message, comment reply, connection request.
//!
//! # Example
//!
//! ```rust,ignore
//! use unipile_client::UnipileClient;
//!
//! let client = UnipileClient::new("api8.unipile.com:13851".into(), "your-api-key".into());
//!
//! let comments = client.fetch_all_comments("acc_123", "urn:li:activity:7012", 10).await?;
//! for comment in &comments {
//!     println!("{}", comment.text);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{Result, UnipileError};
pub use types::{
    ChatStarted, CommentAuthor, CommentList, InvitationSent, PostComment, UserProfile,
};

use reqwest::Response;
use serde::de::DeserializeOwned;
use types::{ApiErrorBody, CommentReplyInput, InvitationInput, StartChatInput};

/// Page size requested from the comments endpoint.
const COMMENTS_PAGE_LIMIT: u32 = 100;

pub struct UnipileClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UnipileClient {
    /// `dsn` is the account-specific host (`api8.unipile.com:13851`) or a full base URL.
    pub fn new(dsn: String, api_key: String) -> Self {
        let base_url = if dsn.starts_with("http://") || dsn.starts_with("https://") {
            format!("{}/api/v1", dsn.trim_end_matches('/'))
        } else {
            format!("https://{}/api/v1", dsn.trim_end_matches('/'))
        };

        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single page of comments for a post.
    pub async fn list_post_comments(
        &self,
        account_id: &str,
        post_id: &str,
        cursor: Option<&str>,
    ) -> Result<CommentList> {
        let url = format!("{}/posts/{}/comments", self.base_url, post_id);
        let limit = COMMENTS_PAGE_LIMIT.to_string();
        let mut query = vec![("account_id", account_id), ("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(&query)
            .send()
            .await?;

        parse_json(resp).await
    }

    /// Fetch every comment on a post by following cursors, in API order.
    ///
    /// A failure on the first page is returned as an error. A failure on a later
    /// page ends pagination and returns what was collected so far.
    pub async fn fetch_all_comments(
        &self,
        account_id: &str,
        post_id: &str,
        max_pages: u32,
    ) -> Result<Vec<PostComment>> {
        let mut comments = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..max_pages.max(1) {
            let result = self
                .list_post_comments(account_id, post_id, cursor.as_deref())
                .await;

            let list = match result {
                Ok(list) => list,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        post_id,
                        page,
                        collected = comments.len(),
                        error = %e,
                        "Comment pagination failed, returning partial result"
                    );
                    break;
                }
            };

            comments.extend(list.items);

            match list.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(post_id, count = comments.len(), "Fetched post comments");
        Ok(comments)
    }

    /// Read a user's profile as seen from `account_id`, including network distance.
    pub async fn get_user_profile(&self, account_id: &str, identifier: &str) -> Result<UserProfile> {
        let url = format!("{}/users/{}", self.base_url, identifier);
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(&[("account_id", account_id)])
            .send()
            .await?;

        parse_json(resp).await
    }

    /// Start (or continue) a 1:1 chat with `attendee_id`.
    pub async fn start_chat(
        &self,
        account_id: &str,
        attendee_id: &str,
        text: &str,
    ) -> Result<ChatStarted> {
        let input = StartChatInput {
            account_id: account_id.to_string(),
            attendees_ids: vec![attendee_id.to_string()],
            text: text.to_string(),
        };

        let url = format!("{}/chats", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&input)
            .send()
            .await?;

        parse_json(resp).await
    }

    /// Publish a reply under an existing comment.
    pub async fn reply_to_comment(
        &self,
        account_id: &str,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<()> {
        let input = CommentReplyInput {
            account_id: account_id.to_string(),
            text: text.to_string(),
            comment_id: comment_id.to_string(),
        };

        let url = format!("{}/posts/{}/comments", self.base_url, post_id);
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&input)
            .send()
            .await?;

        check_status(resp).await.map(|_| ())
    }

    /// Send a connection invitation with an optional note.
    pub async fn send_invitation(
        &self,
        account_id: &str,
        provider_id: &str,
        message: Option<&str>,
    ) -> Result<InvitationSent> {
        let input = InvitationInput {
            provider_id: provider_id.to_string(),
            account_id: account_id.to_string(),
            message: message.map(str::to_string),
        };

        let url = format!("{}/users/invite", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&input)
            .send()
            .await?;

        parse_json(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), body))
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Build an `Api` error, preferring the status carried inside a JSON error body.
fn api_error(http_status: u16, body: String) -> UnipileError {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => {
            let message = parsed
                .detail
                .or(parsed.title)
                .or(parsed.error_type)
                .unwrap_or(body);
            UnipileError::Api {
                status: parsed.status.unwrap_or(http_status),
                message,
            }
        }
        Err(_) => UnipileError::Api {
            status: http_status,
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_bare_dsn() {
        let client = UnipileClient::new("api8.unipile.com:13851".into(), "key".into());
        assert_eq!(client.base_url(), "https://api8.unipile.com:13851/api/v1");
    }

    #[test]
    fn base_url_from_full_url() {
        let client = UnipileClient::new("http://localhost:9000/".into(), "key".into());
        assert_eq!(client.base_url(), "http://localhost:9000/api/v1");
    }

    #[test]
    fn api_error_prefers_nested_status_and_detail() {
        let body = r#"{"status": 404, "type": "errors/resource_not_found", "title": "Not found", "detail": "Post does not exist"}"#;
        match api_error(400, body.to_string()) {
            UnipileError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Post does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_keeps_plain_body() {
        match api_error(502, "Bad gateway".to_string()) {
            UnipileError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
