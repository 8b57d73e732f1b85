//! OpenAI-compatible chat completion client.

use crate::error::{Result, SciSciError};
use crate::llm::model::{CompletionClient, CompletionRequest, ModelConfig};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SciSciError::Config(format!("http client build failed: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
        })
    }

    pub fn parse_response(json: &Value) -> Result<String> {
        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                SciSciError::Completion("missing choices[0].message.content".to_string())
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> SciSciError {
        if e.is_timeout() {
            SciSciError::CompletionTimeout(self.timeout_secs)
        } else {
            SciSciError::from(e)
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[tracing::instrument(
        skip(self, request),
        fields(llm.model = %self.model, message_count = request.messages.len(), temperature = request.temperature)
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?
            .error_for_status()?;

        let json: Value = response.json().await.map_err(|e| self.transport_error(e))?;
        let content = Self::parse_response(&json)?;

        tracing::debug!("completion returned {} chars", content.len());
        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
