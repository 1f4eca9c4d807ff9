use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error: {comment}")]
    Failed { comment: String },
}

impl ApiError {
    /// The handle named by a "User with handle X not found" comment.
    ///
    /// Best effort: depends on upstream wording, callers keep a per-handle
    /// fallback for anything this does not recognise.
    pub fn missing_handle(&self) -> Option<&str> {
        let ApiError::Failed { comment } = self else {
            return None;
        };
        if !comment.contains("not found") {
            return None;
        }
        let (_, rest) = comment.split_once("handle ")?;
        rest.split_whitespace().next()
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}
