use common::agent::orchestrator::{
    schema_violation_message, AnswerEnvelope, NO_DATA_MESSAGE, REPHRASE_MESSAGE,
};
use common::agent::Orchestrator;
use common::db::{ResultSet, StaticExecutor};
use common::llm::{ModelConfig, ScriptedClient};
use common::schema::CATALOG;
use serde_json::{json, Value};
use std::sync::Arc;

fn config() -> ModelConfig {
    ModelConfig {
        max_attempts: 1,
        ..ModelConfig::default()
    }
}

fn papers_by_year() -> ResultSet {
    json!([
        {"year": 2020, "count": 12},
        {"year": 2021, "count": 18},
        {"year": 2022, "count": 9}
    ])
    .as_array()
    .unwrap()
    .iter()
    .map(|row| row.as_object().cloned().unwrap())
    .collect()
}

#[tokio::test]
async fn papers_by_year_yields_summary_and_full_chart() {
    let client = Arc::new(
        ScriptedClient::new()
            .then_ok("SELECT year, COUNT(*) as count FROM papers GROUP BY year ORDER BY year")
            .then_ok(
                r#"```json
{"mark": {"type": "line"}, "data": {"values": [{"year": 2020, "count": 12}]},
 "encoding": {"x": {"field": "year"}, "y": {"field": "count"}},
 "title": "Papers per year", "width": 800, "height": 400}
```"#,
            )
            .then_ok("Publications peaked in 2021 with 18 papers."),
    );
    let executor = Arc::new(StaticExecutor::rows(papers_by_year()));
    let orchestrator = Orchestrator::new(client.clone(), executor.clone(), &config());

    let answer = orchestrator.answer_message("Show me papers by year").await;

    assert_eq!(answer.text, "Publications peaked in 2021 with 18 papers.");
    let spec = answer.vega_spec.expect("chart spec");
    assert_eq!(
        spec["data"]["values"],
        Value::Array(papers_by_year().into_iter().map(Value::Object).collect())
    );
    assert_eq!(spec["title"], "Papers per year");
    assert_eq!(
        executor.received(),
        vec!["SELECT year, COUNT(*) as count FROM papers GROUP BY year ORDER BY year".to_string()]
    );
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn unknown_field_gets_field_limitation_message() {
    let client = Arc::new(ScriptedClient::new().then_ok("invalid_field"));
    let executor = Arc::new(StaticExecutor::rows(papers_by_year()));
    let orchestrator = Orchestrator::new(client.clone(), executor.clone(), &config());

    let answer = orchestrator.answer_message("Papers by journal").await;

    assert_eq!(answer, AnswerEnvelope::text_only(schema_violation_message(&CATALOG)));
    for concept in ["titles", "years", "fields", "citation counts", "affiliations"] {
        assert!(answer.text.contains(concept), "missing {}", concept);
    }
    assert!(executor.received().is_empty());
}

#[tokio::test]
async fn mutating_sql_is_never_executed() {
    let client = Arc::new(ScriptedClient::new().then_ok("```sql\nDROP TABLE papers\n```"));
    let executor = Arc::new(StaticExecutor::rows(papers_by_year()));
    let orchestrator = Orchestrator::new(client.clone(), executor.clone(), &config());

    let answer = orchestrator.answer_message("clean up the papers").await;

    assert_eq!(answer, AnswerEnvelope::text_only(REPHRASE_MESSAGE));
    assert!(answer.text.contains("rephrase"));
    assert!(!answer.text.contains("DROP"));
    assert!(executor.received().is_empty());
}

#[tokio::test]
async fn empty_result_skips_chart_and_summary() {
    let client = Arc::new(
        ScriptedClient::new().then_ok("SELECT title FROM papers WHERE year = 1850"),
    );
    let executor = Arc::new(StaticExecutor::empty());
    let orchestrator = Orchestrator::new(client.clone(), executor.clone(), &config());

    let answer = orchestrator.answer_message("papers from 1850").await;

    assert_eq!(answer, AnswerEnvelope::text_only(NO_DATA_MESSAGE));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn blank_message_never_reaches_generation() {
    let client = Arc::new(ScriptedClient::new().then_ok("SELECT 1"));
    let executor = Arc::new(StaticExecutor::rows(papers_by_year()));
    let orchestrator = Orchestrator::new(client.clone(), executor, &config());

    let answer = orchestrator.answer_message("   ").await;

    assert!(answer.vega_spec.is_none());
    assert_eq!(client.call_count(), 0);
}
