//! Optimizer configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. The cardinality fields are placeholders for a real statistics-driven
//! estimator and feed [`crate::stats::DefaultCardinalityModel`]; the weights feed
//! [`crate::cost::DefaultCostModel`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Row count assumed for a table the catalog has no estimate for.
    pub default_table_rows: f64,
    /// Fraction of input rows a filter keeps.
    pub filter_selectivity: f64,
    /// Output cardinality assumed for every inner join.
    pub join_cardinality: f64,
    /// Output cardinality assumed for every limit.
    pub limit_rows: f64,
    /// Weight for row-processing work in the default cost model.
    pub cpu_weight: f64,
    /// Weight for materialized rows (sort buffers) in the default cost model.
    pub memory_weight: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_table_rows: 1000.0,
            filter_selectivity: 0.5,
            join_cardinality: 1000.0,
            limit_rows: 10.0,
            cpu_weight: 1.0,
            memory_weight: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.default_table_rows, 1000.0);
        assert_eq!(config.filter_selectivity, 0.5);
        assert_eq!(config.limit_rows, 10.0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{ "limit_rows": 25.0 }"#).expect("valid config");
        assert_eq!(config.limit_rows, 25.0);
        assert_eq!(config.filter_selectivity, 0.5);
    }
}
