use crate::agent::chart::{ChartSpec, ChartSpecBuilder};
use crate::agent::generator::{Generation, QueryGenerator};
use crate::agent::parser::Rejection;
use crate::agent::query::UserQuery;
use crate::agent::summarizer::Summarizer;
use crate::config::AppConfig;
use crate::db::{PgExecutor, QueryExecutor};
use crate::error::{Result, SciSciError};
use crate::llm::model::{CompletionClient, ModelConfig};
use crate::llm::openai::OpenAiClient;
use crate::schema::{SchemaCatalog, CATALOG};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const CLARIFY_MESSAGE: &str = "I couldn't understand your question. Could you rephrase it?";
pub const NO_DATA_MESSAGE: &str = "No data found for your query.";
pub const REPHRASE_MESSAGE: &str =
    "Sorry, there was an issue processing your query. Please rephrase your question.";
pub const TECHNICAL_ISSUE_MESSAGE: &str =
    "Sorry, the system encountered a technical issue. Please try again later.";

/// fixed field-limitation message naming every supported concept
pub fn schema_violation_message(catalog: &SchemaCatalog) -> String {
    format!(
        "Sorry, the fields you're asking about don't exist in our database. \
         I can only query {}. Please rephrase your question.",
        catalog.supported_concepts_sentence()
    )
}

/// final response for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    pub text: String,
    pub vega_spec: Option<ChartSpec>,
}

impl AnswerEnvelope {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vega_spec: None,
        }
    }
}

/// pipeline position, recorded on log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generating,
    Executing,
    Visualizing,
    Summarizing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Generating => "generating",
            Stage::Executing => "executing",
            Stage::Visualizing => "visualizing",
            Stage::Summarizing => "summarizing",
        }
    }
}

pub struct Orchestrator {
    catalog: &'static SchemaCatalog,
    generator: QueryGenerator,
    executor: Arc<dyn QueryExecutor>,
    charts: ChartSpecBuilder,
    summarizer: Summarizer,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        executor: Arc<dyn QueryExecutor>,
        model: &ModelConfig,
    ) -> Self {
        let attempts = model.max_attempts;

        Self {
            catalog: &CATALOG,
            generator: QueryGenerator::new(Arc::clone(&client), &CATALOG, attempts),
            executor,
            charts: ChartSpecBuilder::new(Arc::clone(&client), attempts),
            summarizer: Summarizer::new(client, attempts),
        }
    }

    /// openai completion client plus postgres executor
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = OpenAiClient::new(config.require_api_key()?, &config.model)?;
        let executor = PgExecutor::new(
            config.require_database_url()?,
            Duration::from_secs(config.query_timeout_secs),
        );

        Ok(Self::new(Arc::new(client), Arc::new(executor), &config.model))
    }

    /// validate a raw message, then answer it; an over-long message gets the rephrase answer
    pub async fn answer_message(&self, message: &str) -> AnswerEnvelope {
        match UserQuery::new(message) {
            Ok(query) => self.answer(&query).await,
            Err(e) => {
                tracing::warn!("rejected user message: {}", e);
                AnswerEnvelope::text_only(REPHRASE_MESSAGE)
            }
        }
    }

    /// never fails: every internal error becomes a normal-looking answer
    #[tracing::instrument(skip_all, fields(query = %query))]
    pub async fn answer(&self, query: &UserQuery) -> AnswerEnvelope {
        match self.run(query).await {
            Ok(answer) => answer,
            Err((stage, e)) => {
                tracing::error!(stage = stage.as_str(), "request failed: {}", e);
                AnswerEnvelope::text_only(TECHNICAL_ISSUE_MESSAGE)
            }
        }
    }

    async fn run(&self, query: &UserQuery) -> std::result::Result<AnswerEnvelope, (Stage, SciSciError)> {
        let at = |stage: Stage| move |e: SciSciError| (stage, e);

        let generation = self
            .generator
            .generate(query)
            .await
            .map_err(at(Stage::Generating))?;

        let sql = match generation {
            Generation::Sql(sql) => sql,
            Generation::Rejected(rejection) => return Ok(self.rejection_answer(&rejection)),
        };

        let results = self
            .executor
            .execute(&sql)
            .await
            .map_err(at(Stage::Executing))?;

        if results.is_empty() {
            tracing::info!("query returned no rows");
            return Ok(AnswerEnvelope::text_only(NO_DATA_MESSAGE));
        }

        let vega_spec = self
            .charts
            .build(query.as_str(), &sql, &results)
            .await
            .map_err(at(Stage::Visualizing))?;

        let text = self
            .summarizer
            .summarize(query.as_str(), &results)
            .await
            .map_err(at(Stage::Summarizing))?;

        tracing::info!(
            row_count = results.len(),
            has_chart = vega_spec.is_some(),
            "answer ready"
        );

        Ok(AnswerEnvelope { text, vega_spec })
    }

    fn rejection_answer(&self, rejection: &Rejection) -> AnswerEnvelope {
        match rejection {
            Rejection::SchemaViolation => {
                AnswerEnvelope::text_only(schema_violation_message(self.catalog))
            }
            Rejection::Unintelligible => AnswerEnvelope::text_only(CLARIFY_MESSAGE),
            Rejection::ForbiddenOperation(verb) => {
                tracing::warn!(verb = *verb, "generated sql contained a mutating verb");
                AnswerEnvelope::text_only(REPHRASE_MESSAGE)
            }
            Rejection::Empty => AnswerEnvelope::text_only(REPHRASE_MESSAGE),
        }
    }
}
