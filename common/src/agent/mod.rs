pub mod chart;
pub mod generator;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod query;
pub mod summarizer;

pub use chart::{parse_chart_spec, ChartSpec, ChartSpecBuilder};
pub use generator::{Generation, QueryGenerator};
pub use orchestrator::{AnswerEnvelope, Orchestrator, Stage};
pub use parser::{sanitize_sql, strip_wrappers, GeneratedSql, Rejection};
pub use query::{UserQuery, MAX_QUERY_CHARS};
pub use summarizer::Summarizer;
