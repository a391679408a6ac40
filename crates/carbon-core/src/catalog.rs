//! # Catalog Interface
//!
//! The catalog is the optimizer's only window onto table metadata. Scan property
//! derivation asks it for two things:
//!
//! - `table_columns`: the table's attributes, including dropped ones (which are
//!   skipped when registering output columns).
//! - `estimate_row_count`: the table-size estimate used as the scan's cardinality.
//!
//! Both return `None` for unknown tables; derivation then falls back to an empty
//! column set and the cardinality model's default table size.
//!
//! `InMemoryCatalog` is a HashMap-backed implementation for tests and the CLI. A
//! host embedding the optimizer supplies its own implementation backed by its
//! system catalogs and statistics.

use crate::expr::TableRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One attribute of a base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// 1-based attribute number within the table.
    pub attnum: u32,
    /// Dropped attributes keep their slot but produce no output column.
    #[serde(default)]
    pub dropped: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, attnum: u32) -> Self {
        Self {
            name: name.into(),
            attnum,
            dropped: false,
        }
    }

    pub fn dropped(name: impl Into<String>, attnum: u32) -> Self {
        Self {
            name: name.into(),
            attnum,
            dropped: true,
        }
    }
}

/// Catalog provides schema and row-count information.
pub trait Catalog: Send + Sync {
    fn table_columns(&self, table: &TableRef) -> Option<Vec<ColumnDef>>;
    fn estimate_row_count(&self, table: &TableRef) -> Option<f64>;
}

/// In-memory catalog for testing and development.
///
/// Tables are keyed by their fully-qualified name (`schema.table`).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pub table_rows: HashMap<String, f64>,
    pub table_columns: HashMap<String, Vec<ColumnDef>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: &TableRef, columns: Vec<ColumnDef>, row_count: f64) {
        let key = table.to_string();
        self.table_columns.insert(key.clone(), columns);
        self.table_rows.insert(key, row_count);
    }
}

impl Catalog for InMemoryCatalog {
    fn table_columns(&self, table: &TableRef) -> Option<Vec<ColumnDef>> {
        self.table_columns.get(&table.to_string()).cloned()
    }

    fn estimate_row_count(&self, table: &TableRef) -> Option<f64> {
        self.table_rows.get(&table.to_string()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_lookup() {
        let mut catalog = InMemoryCatalog::new();
        let t = TableRef::new("public", "orders");
        catalog.add_table(
            &t,
            vec![ColumnDef::new("id", 1), ColumnDef::dropped("legacy", 2)],
            1500.0,
        );

        assert_eq!(catalog.estimate_row_count(&t), Some(1500.0));
        let cols = catalog.table_columns(&t).unwrap_or_default();
        assert_eq!(cols.len(), 2);
        assert!(cols[1].dropped);

        let missing = TableRef::new("public", "nope");
        assert!(catalog.table_columns(&missing).is_none());
        assert!(catalog.estimate_row_count(&missing).is_none());
    }
}
