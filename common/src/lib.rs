pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod schema;
pub mod tracing;

pub use error::{Result, SciSciError};
