use serde::{Deserialize, Serialize};

/// A comment as returned by the comment gateway. Never persisted; only its id
/// survives in the dedup ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: CommentAuthor,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    /// Platform id of the commenter. Missing when the platform has not
    /// resolved the author yet.
    pub id: Option<String>,
    pub name: Option<String>,
    pub profile_url: Option<String>,
}

impl Comment {
    pub fn new(id: impl Into<String>, author: CommentAuthor, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author,
            text: text.into(),
        }
    }

    /// Author id, if present and non-blank.
    pub fn author_id(&self) -> Option<&str> {
        self.author
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl CommentAuthor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            profile_url: None,
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }
}
