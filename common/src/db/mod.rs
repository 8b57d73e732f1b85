pub mod memory;
pub mod postgres;

pub use memory::StaticExecutor;
pub use postgres::PgExecutor;

use crate::agent::parser::GeneratedSql;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// one result row, column name to scalar, in select-list order
pub type ResultRow = Map<String, Value>;

pub type ResultSet = Vec<ResultRow>;

/// runs validated sql against the data store and materializes every row
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &GeneratedSql) -> Result<ResultSet>;
}
