use crate::agent::parser::GeneratedSql;
use crate::agent::prompt::build_chart_messages;
use crate::db::ResultSet;
use crate::error::Result;
use crate::llm::model::{CompletionClient, CompletionRequest};
use crate::llm::retry::complete_with_retry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

static JSON_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```[ \t]*(?:json\b)?[ \t]*\r?\n?(.*?)```").unwrap()
});

/// a parsed vega-lite document; `data.values` always holds the live result set
pub type ChartSpec = Value;

/// body of a ```json fenced block, or the trimmed text when unfenced
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();

    JSON_FENCE_REGEX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

/// overwrite `data.values` with `results`, creating `data` when missing;
/// `None` when the document cannot hold data values
pub fn inject_data_values(mut spec: Value, results: &ResultSet) -> Option<ChartSpec> {
    let root = spec.as_object_mut()?;

    let data = root
        .entry("data")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()?;

    data.insert(
        "values".to_string(),
        Value::Array(results.iter().cloned().map(Value::Object).collect()),
    );

    Some(spec)
}

/// best-effort parse of a completion into a chart spec
pub fn parse_chart_spec(raw: &str, results: &ResultSet) -> Option<ChartSpec> {
    let body = strip_json_fences(raw);

    match serde_json::from_str::<Value>(body) {
        Ok(spec) => {
            let patched = inject_data_values(spec, results);
            if patched.is_none() {
                tracing::warn!("chart spec is not a json object with a data section, dropping chart");
            }
            patched
        }
        Err(e) => {
            tracing::warn!("chart spec did not parse as json, dropping chart: {}", e);
            None
        }
    }
}

pub struct ChartSpecBuilder {
    client: Arc<dyn CompletionClient>,
    max_attempts: usize,
}

impl ChartSpecBuilder {
    pub fn new(client: Arc<dyn CompletionClient>, max_attempts: usize) -> Self {
        Self {
            client,
            max_attempts,
        }
    }

    /// a malformed spec yields `Ok(None)`; only completion-service errors fail
    #[tracing::instrument(skip_all, fields(stage = "visualizing", row_count = results.len()))]
    pub async fn build(
        &self,
        question: &str,
        sql: &GeneratedSql,
        results: &ResultSet,
    ) -> Result<Option<ChartSpec>> {
        let results_json = serde_json::to_string(results)?;
        let request = CompletionRequest::deterministic(build_chart_messages(
            question,
            sql.as_str(),
            &results_json,
        ));

        let raw = complete_with_retry(self.client.as_ref(), &request, self.max_attempts).await?;
        let spec = parse_chart_spec(&raw, results);

        tracing::info!(has_chart = spec.is_some(), "chart spec built");
        Ok(spec)
    }
}
