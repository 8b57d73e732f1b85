//! Postgres-backed executor: one connection per statement.

use crate::agent::parser::GeneratedSql;
use crate::db::{QueryExecutor, ResultRow, ResultSet};
use crate::error::{Result, SciSciError};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Row, TypeInfo};
use std::time::Duration;

pub struct PgExecutor {
    database_url: String,
    timeout: Duration,
}

impl PgExecutor {
    pub fn new(database_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            database_url: database_url.into(),
            timeout,
        }
    }

    async fn run(&self, sql: &GeneratedSql) -> Result<ResultSet> {
        let mut conn = PgConnection::connect(&self.database_url).await?;

        let fetched = sqlx::query(sql.as_str()).fetch_all(&mut conn).await;

        // release the connection whether or not the statement succeeded
        if let Err(e) = conn.close().await {
            tracing::warn!("failed to close database connection: {}", e);
        }

        let rows = fetched?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    #[tracing::instrument(skip(self, sql), fields(stage = "executing"))]
    async fn execute(&self, sql: &GeneratedSql) -> Result<ResultSet> {
        let rows = tokio::time::timeout(self.timeout, self.run(sql))
            .await
            .map_err(|_| {
                SciSciError::ExecutionFailed(format!(
                    "query timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        tracing::info!(row_count = rows.len(), "query executed");
        Ok(rows)
    }
}

fn row_to_json(row: &PgRow) -> ResultRow {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// how a postgres column is decoded; unrecognized types are read as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Bool,
    Text,
}

impl ColumnKind {
    fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "INT2" => ColumnKind::Int2,
            "INT4" => ColumnKind::Int4,
            "INT8" => ColumnKind::Int8,
            "FLOAT4" => ColumnKind::Float4,
            "FLOAT8" => ColumnKind::Float8,
            "NUMERIC" => ColumnKind::Numeric,
            "BOOL" => ColumnKind::Bool,
            _ => ColumnKind::Text,
        }
    }
}

#[derive(Debug)]
enum Cell {
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Bool(bool),
    Text(String),
}

/// scalar json for a decoded cell; sql null and out-of-range numerics become null
fn cell_to_json(cell: Option<Cell>) -> Value {
    match cell {
        Some(Cell::Int(i)) => Value::from(i),
        Some(Cell::Float(f)) => Value::from(f),
        Some(Cell::Numeric(d)) => d.to_f64().map(Value::from).unwrap_or(Value::Null),
        Some(Cell::Bool(b)) => Value::from(b),
        Some(Cell::Text(s)) => Value::from(s),
        None => Value::Null,
    }
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

/// undecodable cells become null
fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let cell = match ColumnKind::from_type_name(type_name) {
        ColumnKind::Int2 => get::<i16>(row, idx).map(|i| Cell::Int(i.into())),
        ColumnKind::Int4 => get::<i32>(row, idx).map(|i| Cell::Int(i.into())),
        ColumnKind::Int8 => get::<i64>(row, idx).map(Cell::Int),
        ColumnKind::Float4 => get::<f32>(row, idx).map(|f| Cell::Float(f.into())),
        ColumnKind::Float8 => get::<f64>(row, idx).map(Cell::Float),
        ColumnKind::Numeric => get::<Decimal>(row, idx).map(Cell::Numeric),
        ColumnKind::Bool => get::<bool>(row, idx).map(Cell::Bool),
        ColumnKind::Text => get::<String>(row, idx).map(Cell::Text),
    };

    cell_to_json(cell)
}
