use crate::error::{Result, SciSciError};
use crate::llm::model::{CompletionClient, CompletionRequest};

/// call the completion service, repeating transient failures up to `max_attempts` calls
#[tracing::instrument(skip(client, request), fields(client = client.name()))]
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
    max_attempts: usize,
) -> Result<String> {
    let max_attempts = max_attempts.max(1);
    let mut last_error: Option<SciSciError> = None;

    for attempt in 1..=max_attempts {
        match client.complete(request).await {
            Ok(text) => {
                if attempt > 1 {
                    tracing::info!("completion succeeded on attempt {}", attempt);
                }
                return Ok(text);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!("completion attempt {}/{} failed: {}", attempt, max_attempts, e);
                last_error = Some(e);
            }
            Err(e) => {
                tracing::warn!("completion attempt {}/{} failed: {}", attempt, max_attempts, e);
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        SciSciError::Completion(format!("completion failed after {} attempts", max_attempts))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::model::Message;
    use crate::llm::scripted::ScriptedClient;

    fn request() -> CompletionRequest {
        CompletionRequest::deterministic(vec![Message::user("q")])
    }

    #[tokio::test]
    async fn test_retries_transient_failure_once() {
        let client = ScriptedClient::new()
            .then_err(SciSciError::CompletionTimeout(30))
            .then_ok("SELECT 1");

        let text = complete_with_retry(&client, &request(), 2).await.unwrap();

        assert_eq!(text, "SELECT 1");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_failure() {
        let client = ScriptedClient::new()
            .then_err(SciSciError::CompletionStatus(401))
            .then_ok("SELECT 1");

        let result = complete_with_retry(&client, &request(), 3).await;

        assert!(matches!(result, Err(SciSciError::CompletionStatus(401))));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_does_not_retry_malformed_response() {
        let client = ScriptedClient::new()
            .then_err(SciSciError::Completion("missing choices[0].message.content".to_string()))
            .then_ok("SELECT 1");

        let result = complete_with_retry(&client, &request(), 2).await;

        assert!(matches!(result, Err(SciSciError::Completion(_))));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_connection_failure() {
        let client = ScriptedClient::new()
            .then_err(SciSciError::CompletionTransport("connection reset".to_string()))
            .then_ok("SELECT 1");

        let text = complete_with_retry(&client, &request(), 2).await.unwrap();

        assert_eq!(text, "SELECT 1");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let client = ScriptedClient::new()
            .then_err(SciSciError::CompletionStatus(503))
            .then_err(SciSciError::CompletionStatus(503))
            .then_ok("never reached");

        let result = complete_with_retry(&client, &request(), 2).await;

        assert!(matches!(result, Err(SciSciError::CompletionStatus(503))));
        assert_eq!(client.call_count(), 2);
    }
}
