//! # Cost Model
//!
//! This module defines the cost abstraction and a default cost model for the optimizer.
//!
//! ## Weighted Cost
//!
//! The `DefaultCostModel` collapses two dimensions into a single comparable `Cost`:
//!
//! ```text
//! total_cost = cpu_weight * cpu_cost + memory_weight * memory_cost
//! ```
//!
//! CPU cost is proportional to the rows an operator touches; memory cost is only
//! charged by operators that materialize their input (Sort).
//!
//! ## Cost Accumulation
//!
//! Costs are **additive**: the total cost of a plan is the local cost of its root
//! operator plus the accumulated costs of the child plans. The scheduler passes the
//! children's winner costs in, so `compute_cost` returns the full subtree cost.
//!
//! ## Pluggable Design
//!
//! Row counts come from the logical properties of the expression's group and of
//! its child groups, so a replacement model sees exactly what the default one does.

use crate::expr::PhysicalOp;
use crate::properties::LogicalProperties;
use serde::{Deserialize, Serialize};

/// Cost is a single comparable value representing the estimated expense of a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cost {
    /// The total weighted cost. Lower is better. `f64::MAX` represents infinity
    /// (an infeasible or not-yet-costed plan).
    pub total: f64,
}

impl Cost {
    pub fn zero() -> Self {
        Self { total: 0.0 }
    }

    /// Totals that overflow to `+inf` saturate at [`Cost::infinite`].
    pub fn new(total: f64) -> Self {
        Self {
            total: total.min(f64::MAX),
        }
    }

    pub fn infinite() -> Self {
        Self { total: f64::MAX }
    }

    pub fn is_infinite(&self) -> bool {
        self.total == f64::MAX
    }
}

impl Default for Cost {
    fn default() -> Self {
        Self::zero()
    }
}

/// Epsilon-based equality to handle floating-point imprecision in cost comparisons.
impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        (self.total - other.total).abs() < f64::EPSILON
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.total.partial_cmp(&other.total)
    }
}

/// Trait for pluggable cost models.
pub trait CostModel: Send + Sync {
    /// Full cost of a physical expression: its local cost plus `children_costs`.
    ///
    /// `output` is the expression's own group properties; `inputs` holds one entry
    /// per child group.
    fn compute_cost(
        &self,
        op: &PhysicalOp,
        output: &LogicalProperties,
        inputs: &[&LogicalProperties],
        children_costs: &[Cost],
    ) -> Cost;
}

/// Default cost model: weighted CPU and memory.
#[derive(Debug, Clone)]
pub struct DefaultCostModel {
    /// Weight for CPU-bound operations (row processing, comparisons).
    pub cpu_weight: f64,
    /// Weight for memory-bound operations (sort buffers).
    pub memory_weight: f64,
}

impl Default for DefaultCostModel {
    fn default() -> Self {
        Self {
            cpu_weight: 1.0,
            memory_weight: 1.0,
        }
    }
}

impl DefaultCostModel {
    pub fn from_config(config: &crate::config::OptimizerConfig) -> Self {
        Self {
            cpu_weight: config.cpu_weight,
            memory_weight: config.memory_weight,
        }
    }
}

impl CostModel for DefaultCostModel {
    fn compute_cost(
        &self,
        op: &PhysicalOp,
        output: &LogicalProperties,
        inputs: &[&LogicalProperties],
        children_costs: &[Cost],
    ) -> Cost {
        let children_total: f64 = children_costs.iter().map(|c| c.total).sum();
        // Unary operators without input properties fall back to their own output.
        let input_rows = inputs
            .first()
            .map_or(output.cardinality(), |p| p.cardinality());

        let local_cost = match op {
            // Every row of the table is read once.
            PhysicalOp::TableScan { .. } => self.cpu_weight * output.cardinality(),
            // One predicate evaluation or one expression-list evaluation per input row.
            PhysicalOp::Filter { .. } | PhysicalOp::Projection { .. } => {
                self.cpu_weight * input_rows
            }
            // Stops pulling once the bound is reached.
            PhysicalOp::Limit { .. } => self.cpu_weight * output.cardinality().min(input_rows),
            // O(n log n) comparisons plus a buffer holding every input row.
            PhysicalOp::Sort { .. } => {
                let n_log_n = if input_rows > 1.0 {
                    input_rows * input_rows.log2()
                } else {
                    1.0
                };
                self.cpu_weight * n_log_n + self.memory_weight * input_rows
            }
            // O(n * m): for every outer row, scans all inner rows.
            PhysicalOp::NestedLoopJoin { .. } => {
                if inputs.len() < 2 {
                    return Cost::new(children_total + self.cpu_weight * output.cardinality());
                }
                self.cpu_weight
                    * inputs
                        .iter()
                        .map(|p| p.cardinality())
                        .product::<f64>()
            }
        };

        Cost::new(children_total + local_cost)
    }
}
