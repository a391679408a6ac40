//! # JSON Inputs
//!
//! The CLI stands in for a host translator: it reads an operator tree, a catalog
//! and an optional optimizer config from JSON files.
//!
//! A catalog file lists tables with their attributes and row counts:
//!
//! ```json
//! { "tables": [
//!     { "schema": "public", "name": "t", "row_count": 1000,
//!       "columns": [ { "name": "a", "attnum": 1 },
//!                    { "name": "old", "attnum": 2, "dropped": true } ] }
//! ] }
//! ```
//!
//! The operator tree is the serde form of `OperatorNode`.

use crate::error::CliError;
use carbon_core::catalog::{ColumnDef, InMemoryCatalog};
use carbon_core::config::OptimizerConfig;
use carbon_core::expr::{OperatorNode, TableRef};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableEntry {
    pub schema: String,
    pub name: String,
    /// Omitted row counts fall back to the configured default table size.
    pub row_count: Option<f64>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl CatalogFile {
    pub fn into_catalog(self, default_rows: f64) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for entry in self.tables {
            let table = TableRef::new(entry.schema, entry.name);
            catalog.add_table(&table, entry.columns, entry.row_count.unwrap_or(default_rows));
        }
        catalog
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_plan(path: &Path) -> Result<OperatorNode, CliError> {
    read_json(path)
}

pub fn load_catalog(path: Option<&Path>) -> Result<CatalogFile, CliError> {
    match path {
        Some(p) => read_json(p),
        None => Ok(CatalogFile::default()),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<OptimizerConfig, CliError> {
    match path {
        Some(p) => read_json(p),
        None => Ok(OptimizerConfig::default()),
    }
}
