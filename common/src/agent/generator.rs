use crate::agent::parser::{sanitize_sql, GeneratedSql, Rejection};
use crate::agent::prompt::build_generation_messages;
use crate::agent::query::UserQuery;
use crate::error::{Result, SciSciError};
use crate::llm::model::{CompletionClient, CompletionRequest};
use crate::llm::retry::complete_with_retry;
use crate::schema::SchemaCatalog;
use std::sync::Arc;

/// outcome of asking the model for sql
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Sql(GeneratedSql),
    Rejected(Rejection),
}

pub struct QueryGenerator {
    client: Arc<dyn CompletionClient>,
    catalog: &'static SchemaCatalog,
    max_attempts: usize,
}

impl QueryGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        catalog: &'static SchemaCatalog,
        max_attempts: usize,
    ) -> Self {
        Self {
            client,
            catalog,
            max_attempts,
        }
    }

    /// one zero-temperature completion piped through the sanitizer;
    /// errors are upstream failures wrapped as `GenerationFailed`
    #[tracing::instrument(skip(self, query), fields(stage = "generating", query_len = query.as_str().len()))]
    pub async fn generate(&self, query: &UserQuery) -> Result<Generation> {
        let request = CompletionRequest::deterministic(build_generation_messages(
            self.catalog,
            query.as_str(),
        ));

        let raw = complete_with_retry(self.client.as_ref(), &request, self.max_attempts)
            .await
            .map_err(|e| SciSciError::GenerationFailed(e.to_string()))?;

        match sanitize_sql(&raw) {
            Ok(sql) => {
                tracing::info!(sql = %sql, "sql generated");
                Ok(Generation::Sql(sql))
            }
            Err(rejection) => {
                tracing::warn!(raw_len = raw.len(), "generated sql rejected: {}", rejection);
                Ok(Generation::Rejected(rejection))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedClient;
    use crate::schema::CATALOG;

    fn generator(client: Arc<ScriptedClient>) -> QueryGenerator {
        QueryGenerator::new(client, &CATALOG, 1)
    }

    #[tokio::test]
    async fn test_generate_sanitizes_completion() {
        let client = Arc::new(ScriptedClient::new().then_ok(
            "```sql\nSELECT year, COUNT(*) as count FROM papers GROUP BY year ORDER BY year\n```",
        ));
        let query = UserQuery::new("Show me papers by year").unwrap();

        let generation = generator(client.clone()).generate(&query).await.unwrap();

        match generation {
            Generation::Sql(sql) => assert_eq!(
                sql.as_str(),
                "SELECT year, COUNT(*) as count FROM papers GROUP BY year ORDER BY year"
            ),
            other => panic!("expected sql, got {:?}", other),
        }

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(
            requests[0].user_content(),
            Some("Generate SQL for: Show me papers by year")
        );
    }

    #[tokio::test]
    async fn test_generate_reports_schema_violation() {
        let client = Arc::new(ScriptedClient::new().then_ok("INVALID_FIELD"));
        let query = UserQuery::new("Papers by journal").unwrap();

        let generation = generator(client).generate(&query).await.unwrap();

        assert_eq!(generation, Generation::Rejected(Rejection::SchemaViolation));
    }

    #[tokio::test]
    async fn test_generate_reports_forbidden_operation() {
        let client = Arc::new(ScriptedClient::new().then_ok("DROP TABLE papers"));
        let query = UserQuery::new("remove everything").unwrap();

        let generation = generator(client).generate(&query).await.unwrap();

        assert_eq!(
            generation,
            Generation::Rejected(Rejection::ForbiddenOperation("DROP"))
        );
    }

    #[tokio::test]
    async fn test_generate_wraps_upstream_failure() {
        let client = Arc::new(ScriptedClient::new().then_err(SciSciError::CompletionStatus(500)));
        let query = UserQuery::new("anything").unwrap();

        let result = generator(client).generate(&query).await;

        assert!(matches!(result, Err(SciSciError::GenerationFailed(_))));
    }
}
