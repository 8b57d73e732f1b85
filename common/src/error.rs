use thiserror::Error;

#[derive(Error, Debug)]
pub enum SciSciError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("completion service unreachable: {0}")]
    CompletionTransport(String),

    #[error("completion request timed out after {0}s")]
    CompletionTimeout(u64),

    #[error("completion service returned status {0}")]
    CompletionStatus(u16),

    #[error("sql generation failed: {0}")]
    GenerationFailed(String),

    #[error("query execution failed: {0}")]
    ExecutionFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl SciSciError {
    /// whether a failed completion call is worth repeating
    pub fn is_transient(&self) -> bool {
        match self {
            SciSciError::CompletionTimeout(_) => true,
            SciSciError::CompletionStatus(status) => *status == 429 || *status >= 500,
            SciSciError::CompletionTransport(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SciSciError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            SciSciError::CompletionStatus(status.as_u16())
        } else if e.is_connect() || e.is_request() {
            SciSciError::CompletionTransport(e.to_string())
        } else {
            SciSciError::Completion(e.to_string())
        }
    }
}

impl From<sqlx::Error> for SciSciError {
    fn from(e: sqlx::Error) -> Self {
        SciSciError::ExecutionFailed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SciSciError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SciSciError::CompletionTimeout(30).is_transient());
        assert!(SciSciError::CompletionStatus(503).is_transient());
        assert!(SciSciError::CompletionStatus(429).is_transient());
        assert!(!SciSciError::CompletionStatus(401).is_transient());
        assert!(SciSciError::CompletionTransport("connection refused".to_string()).is_transient());
        assert!(!SciSciError::Completion("missing choices[0].message.content".to_string()).is_transient());
        assert!(!SciSciError::ExecutionFailed("boom".to_string()).is_transient());
    }
}
