use crate::agent::prompt::build_analysis_messages;
use crate::db::ResultSet;
use crate::error::Result;
use crate::llm::model::{CompletionClient, CompletionRequest, SUMMARY_TEMPERATURE};
use crate::llm::retry::complete_with_retry;
use std::sync::Arc;

/// rows shown to the model when writing the analysis
pub const SUMMARY_SAMPLE_ROWS: usize = 10;

pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    max_attempts: usize,
}

impl Summarizer {
    pub fn new(client: Arc<dyn CompletionClient>, max_attempts: usize) -> Self {
        Self {
            client,
            max_attempts,
        }
    }

    #[tracing::instrument(skip_all, fields(stage = "summarizing", row_count = results.len()))]
    pub async fn summarize(&self, question: &str, results: &ResultSet) -> Result<String> {
        let sample = &results[..results.len().min(SUMMARY_SAMPLE_ROWS)];
        let sample_json = serde_json::to_string(sample)?;

        let request = CompletionRequest::new(
            build_analysis_messages(question, &sample_json),
            SUMMARY_TEMPERATURE,
        );

        let text = complete_with_retry(self.client.as_ref(), &request, self.max_attempts).await?;
        Ok(text.trim().to_string())
    }
}
