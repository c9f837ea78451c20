use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnipileError>;

#[derive(Debug, Clone, Error)]
pub enum UnipileError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl UnipileError {
    /// HTTP status for API errors, `None` for transport and parse failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            UnipileError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UnipileError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return UnipileError::Timeout(err.to_string());
        }
        match err.status() {
            Some(status) => UnipileError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => UnipileError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for UnipileError {
    fn from(err: serde_json::Error) -> Self {
        UnipileError::Parse(err.to_string())
    }
}
