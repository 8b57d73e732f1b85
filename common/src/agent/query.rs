use crate::error::{Result, SciSciError};
use std::fmt;

pub const MAX_QUERY_CHARS: usize = 500;

/// a trimmed, non-empty user question of at most [`MAX_QUERY_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery(String);

impl UserQuery {
    pub fn new(message: &str) -> Result<Self> {
        let trimmed = message.trim();

        if trimmed.is_empty() {
            return Err(SciSciError::InvalidQuery("message cannot be empty".to_string()));
        }

        let chars = trimmed.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(SciSciError::InvalidQuery(format!(
                "message is {} characters, limit is {}",
                chars, MAX_QUERY_CHARS
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
