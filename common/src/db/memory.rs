use crate::agent::parser::GeneratedSql;
use crate::db::{QueryExecutor, ResultSet};
use crate::error::{Result, SciSciError};
use async_trait::async_trait;
use std::sync::Mutex;

/// executor that answers every statement with the same rows (or the same failure)
pub struct StaticExecutor {
    outcome: std::result::Result<ResultSet, String>,
    received: Mutex<Vec<String>>,
}

impl StaticExecutor {
    pub fn rows(rows: ResultSet) -> Self {
        Self {
            outcome: Ok(rows),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::rows(Vec::new())
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// statements executed so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QueryExecutor for StaticExecutor {
    async fn execute(&self, sql: &GeneratedSql) -> Result<ResultSet> {
        if let Ok(mut received) = self.received.lock() {
            received.push(sql.as_str().to_string());
        }

        self.outcome
            .clone()
            .map_err(SciSciError::ExecutionFailed)
    }
}
