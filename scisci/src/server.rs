use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use common::agent::Orchestrator;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(orchestrator)
}

pub async fn serve(orchestrator: Arc<Orchestrator>, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

async fn chat(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let message = match request.message.as_deref() {
        Some(message) if !message.trim().is_empty() => message,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Message is required"})),
            )
                .into_response()
        }
    };

    Json(orchestrator.answer_message(message).await).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use common::db::StaticExecutor;
    use common::llm::{ModelConfig, ScriptedClient};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(client: Arc<ScriptedClient>) -> Router {
        let config = ModelConfig {
            max_attempts: 1,
            ..ModelConfig::default()
        };
        let executor = Arc::new(StaticExecutor::empty());
        router(Arc::new(Orchestrator::new(client, executor, &config)))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_message_is_bad_request() {
        let client = Arc::new(ScriptedClient::new());

        for body in [r#"{}"#, r#"{"message": ""}"#, r#"{"message": "   "}"#] {
            let response = app(client.clone()).oneshot(post_json(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "Message is required");
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_business_failure_is_still_ok() {
        let client = Arc::new(ScriptedClient::new().then_ok("SELECT title FROM papers WHERE year = 1850"));

        let response = app(client)
            .oneshot(post_json(r#"{"message": "papers from 1850"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "No data found for your query.");
        assert!(body["vega_spec"].is_null());
    }
}
