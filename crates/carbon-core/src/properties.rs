//! # Logical Properties
//!
//! Logical properties are shared by every expression in a group because they
//! describe *what* the group produces: its output columns and its estimated row
//! count. They are derived exactly once, when the group is created, from the
//! group's first logical expression and the properties of its child groups.
//! Children are always created first, so derivation is strictly bottom-up.
//!
//! ## Derivation Rules
//!
//! | Operator  | Output columns                               | Cardinality            |
//! |-----------|----------------------------------------------|------------------------|
//! | Scan      | one new table column per live attribute      | catalog estimate       |
//! | Join      | union of the children's columns              | join model             |
//! | Filter    | child's columns                              | child × selectivity    |
//! | Project   | one new expression column per expression     | child                  |
//! | Sort      | child's columns                              | child                  |
//! | Limit     | child's columns                              | limit model            |
//! | Aggregate | one new expression column per key/aggregate  | aggregate model        |
//!
//! ## Missing Inputs
//!
//! A unary operator whose child is absent or has no properties derives an empty
//! column set with cardinality 0 instead of failing. A join skips missing
//! children and unions whatever remains.

use crate::catalog::Catalog;
use crate::column::{ColSet, Column, ColumnRegistry};
use crate::expr::{Expr, LogicalOp};
use crate::stats::CardinalityModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Logical properties are derived from the logical content of a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalProperties {
    output_columns: ColSet,
    cardinality: f64,
}

impl LogicalProperties {
    /// Negative or NaN cardinalities are clamped to 0.
    pub fn new(output_columns: ColSet, cardinality: f64) -> Self {
        Self {
            output_columns,
            cardinality: if cardinality > 0.0 { cardinality } else { 0.0 },
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn output_columns(&self) -> &ColSet {
        &self.output_columns
    }

    pub fn cardinality(&self) -> f64 {
        self.cardinality
    }
}

/// External collaborators consulted during derivation.
#[derive(Clone, Copy)]
pub struct DeriveContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub cardinality: &'a dyn CardinalityModel,
}

/// Derive the properties of a logical operator from its inputs' properties.
///
/// `inputs` holds one entry per child group, `None` where the child has no
/// properties. New columns (scan attributes, projected expressions) are registered
/// in `columns`.
pub fn derive_logical_props(
    op: &LogicalOp,
    columns: &mut ColumnRegistry,
    inputs: &[Option<&LogicalProperties>],
    ctx: DeriveContext<'_>,
) -> LogicalProperties {
    match op {
        LogicalOp::Scan { table, rt_index } => {
            let mut output = ColSet::new();
            match ctx.catalog.table_columns(table) {
                Some(defs) => {
                    for def in defs.into_iter().filter(|d| !d.dropped) {
                        let id = columns.register(Column::Table {
                            table: table.clone(),
                            rt_index: *rt_index,
                            attnum: def.attnum,
                            name: def.name,
                        });
                        output.add(id);
                    }
                }
                None => debug!("No columns in catalog for {}", table),
            }
            let rows = ctx
                .cardinality
                .scan_rows(table, ctx.catalog.estimate_row_count(table));
            LogicalProperties::new(output, rows)
        }
        LogicalOp::Join { condition } => {
            let mut output = ColSet::new();
            let mut rows = Vec::with_capacity(inputs.len());
            for props in inputs.iter().flatten() {
                output.union(props.output_columns());
                rows.push(props.cardinality());
            }
            LogicalProperties::new(output, ctx.cardinality.join_rows(condition, &rows))
        }
        LogicalOp::Filter { predicate } => match sole_input(inputs) {
            Some(child) => LogicalProperties::new(
                child.output_columns().clone(),
                ctx.cardinality.filter_rows(predicate, child.cardinality()),
            ),
            None => missing_input(op),
        },
        LogicalOp::Project { exprs, aliases } => match sole_input(inputs) {
            Some(child) => LogicalProperties::new(
                register_exprs(columns, exprs, aliases),
                child.cardinality(),
            ),
            None => missing_input(op),
        },
        LogicalOp::Sort { .. } => match sole_input(inputs) {
            Some(child) => child.clone(),
            None => missing_input(op),
        },
        LogicalOp::Limit { offset, count } => match sole_input(inputs) {
            Some(child) => LogicalProperties::new(
                child.output_columns().clone(),
                ctx.cardinality
                    .limit_rows(*offset, *count, child.cardinality()),
            ),
            None => missing_input(op),
        },
        LogicalOp::Aggregate {
            group_by,
            aggregates,
        } => match sole_input(inputs) {
            Some(child) => {
                let mut output = register_exprs(columns, group_by, &[]);
                for agg in aggregates {
                    output.add(columns.register(Column::Expr {
                        expr: Expr::Function {
                            name: format!("{:?}", agg.func).to_lowercase(),
                            args: vec![agg.arg.clone()],
                        },
                        alias: None,
                    }));
                }
                LogicalProperties::new(
                    output,
                    ctx.cardinality
                        .aggregate_rows(group_by, child.cardinality()),
                )
            }
            None => missing_input(op),
        },
    }
}

fn sole_input<'a>(inputs: &[Option<&'a LogicalProperties>]) -> Option<&'a LogicalProperties> {
    inputs.first().copied().flatten()
}

fn missing_input(op: &LogicalOp) -> LogicalProperties {
    debug!("{:?} derived without input properties", op.kind());
    LogicalProperties::empty()
}

fn register_exprs(columns: &mut ColumnRegistry, exprs: &[Expr], aliases: &[String]) -> ColSet {
    exprs
        .iter()
        .enumerate()
        .map(|(i, expr)| {
            columns.register(Column::Expr {
                expr: expr.clone(),
                alias: aliases.get(i).cloned(),
            })
        })
        .collect()
}
