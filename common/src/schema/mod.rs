pub mod catalog;

pub use catalog::{Column, SchemaCatalog, Table, TableDescription, CATALOG};
