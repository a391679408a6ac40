//! # Cardinality Estimation
//!
//! Property derivation asks a [`CardinalityModel`] for every row-count estimate it
//! cannot take straight from a child. The default model reproduces the classic
//! placeholder formulas:
//!
//! - **Scan**: the catalog's row-count estimate, or `default_table_rows` when the
//!   catalog has none.
//! - **Filter**: `input_rows * filter_selectivity` (0.5 unless configured).
//! - **Join**: a fixed `join_cardinality`, independent of the inputs.
//! - **Limit**: a fixed `limit_rows` bound, independent of the input.
//! - **Aggregate**: the input row count.
//!
//! Projection and Sort never consult the model: they pass their child's
//! cardinality through unchanged.
//!
//! A statistics-driven estimator (NDV-based join selectivity, histogram ranges)
//! plugs in by implementing the trait; nothing else in the search depends on
//! these constants.

use crate::config::OptimizerConfig;
use crate::expr::{Expr, TableRef};

/// Pluggable row-count estimates used during logical property derivation.
pub trait CardinalityModel: Send + Sync {
    fn scan_rows(&self, table: &TableRef, catalog_estimate: Option<f64>) -> f64;
    fn filter_rows(&self, predicate: &Expr, input_rows: f64) -> f64;
    fn join_rows(&self, condition: &Expr, input_rows: &[f64]) -> f64;
    fn limit_rows(&self, offset: Option<u64>, count: Option<u64>, input_rows: f64) -> f64;
    fn aggregate_rows(&self, group_by: &[Expr], input_rows: f64) -> f64;
}

/// Placeholder constants standing in for a real estimator.
#[derive(Debug, Clone)]
pub struct DefaultCardinalityModel {
    pub default_table_rows: f64,
    pub filter_selectivity: f64,
    pub join_cardinality: f64,
    pub limit_rows: f64,
}

impl Default for DefaultCardinalityModel {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl DefaultCardinalityModel {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            default_table_rows: config.default_table_rows,
            filter_selectivity: config.filter_selectivity,
            join_cardinality: config.join_cardinality,
            limit_rows: config.limit_rows,
        }
    }
}

impl CardinalityModel for DefaultCardinalityModel {
    fn scan_rows(&self, _table: &TableRef, catalog_estimate: Option<f64>) -> f64 {
        match catalog_estimate {
            Some(rows) if rows >= 0.0 => rows,
            _ => self.default_table_rows,
        }
    }

    fn filter_rows(&self, _predicate: &Expr, input_rows: f64) -> f64 {
        input_rows * self.filter_selectivity
    }

    fn join_rows(&self, _condition: &Expr, _input_rows: &[f64]) -> f64 {
        self.join_cardinality
    }

    fn limit_rows(&self, _offset: Option<u64>, _count: Option<u64>, _input_rows: f64) -> f64 {
        self.limit_rows
    }

    fn aggregate_rows(&self, _group_by: &[Expr], input_rows: f64) -> f64 {
        input_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_formulas() {
        let model = DefaultCardinalityModel::default();
        let t = TableRef::new("public", "t");
        let pred = Expr::int(1);

        assert_eq!(model.scan_rows(&t, Some(250.0)), 250.0);
        assert_eq!(model.scan_rows(&t, None), 1000.0);
        assert_eq!(model.filter_rows(&pred, 1000.0), 500.0);
        assert_eq!(model.join_rows(&pred, &[5.0, 7.0]), 1000.0);
        assert_eq!(model.limit_rows(None, Some(3), 1_000_000.0), 10.0);
    }

    #[test]
    fn test_from_config() {
        let config = OptimizerConfig {
            filter_selectivity: 0.25,
            limit_rows: 42.0,
            ..OptimizerConfig::default()
        };
        let model = DefaultCardinalityModel::from_config(&config);
        assert_eq!(model.filter_rows(&Expr::int(1), 200.0), 50.0);
        assert_eq!(model.limit_rows(None, None, 0.0), 42.0);
    }
}
