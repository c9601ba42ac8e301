use thiserror::Error;

/// Failures while fetching ideas, either from the model or from our own
/// endpoint. None of these reach end users; callers fall back to static ideas.
#[derive(Debug, Error)]
pub enum IdeaError {
    #[error("failed to build model client: {0}")]
    Client(String),
    #[error("model request failed: {0}")]
    Upstream(String),
    #[error("model returned no usable ideas")]
    EmptyReply,
    #[error("idea request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("idea endpoint answered {0}")]
    Status(reqwest::StatusCode),
}
