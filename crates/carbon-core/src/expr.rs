//! # Expression and Operator Types
//!
//! This module defines the plan representation the optimizer searches over.
//! It is organized into three layers:
//!
//! ## Scalar Expressions (`Expr`)
//! Scalar expressions are opaque to the search: they are carried inside operators
//! (filter predicates, projection lists, sort keys, join conditions) and copied
//! unchanged by rules. They only need to be hashable so that operators can be
//! deduplicated in the memo.
//!
//! ## Logical Operators (`LogicalOp`)
//! Logical operators describe *what* to compute. Every logical kind has a
//! property derivation (see [`crate::properties`]) that runs once, when the group
//! holding it is created.
//!
//! ## Physical Operators (`PhysicalOp`)
//! Physical operators describe *how* to execute a computation. Implementation
//! rules produce them from logical operators; they carry no further logical
//! meaning and are never derived from.
//!
//! ## Unified `Operator` Enum
//! `Operator` wraps both so the memo stores them uniformly. `OpKind` is the
//! data-free discriminant used for rule matching.
//!
//! ## Operator Trees
//! `OperatorNode` is the externally supplied seed tree: an operator plus its
//! ordered inputs. The optimizer never mutates it.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a base table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column by name, as written in a scalar expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            table: table.map(str::to_string),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Constant values appearing in expressions.
///
/// `f64` is wrapped in `OrderedFloat` so that operators holding literals can be
/// hashed for memo deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{}", v.0),
            ScalarValue::Utf8(s) => write!(f, "'{s}'"),
        }
    }
}

/// Scalar expressions used in predicates, projections, join conditions and sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(ScalarValue),
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// Conjunction stored as a flat list.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn col(table: &str, name: &str) -> Self {
        Expr::Column(ColumnRef::new(Some(table), name))
    }

    pub fn int(v: i64) -> Self {
        Expr::Literal(ScalarValue::Int64(v))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{c}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::BinaryOp { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::IsNull => write!(f, "{operand} IS NULL"),
                UnaryOp::IsNotNull => write!(f, "{operand} IS NOT NULL"),
            },
            Expr::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                let sep = if matches!(self, Expr::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{sep}")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: AggFunc,
    pub arg: Expr,
    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl SortKey {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            ascending: true,
            nulls_first: false,
        }
    }
}

/// Logical operators -- represent *what* to compute, not *how*.
///
/// Children are not stored here: in the seed tree they live in
/// [`OperatorNode::inputs`], in the memo they are group ids on the `MemoExpr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Leaf scan of a base table. `rt_index` is the position of the table in the
    /// host's range table, so two scans of the same table stay distinct.
    Scan { table: TableRef, rt_index: u32 },
    /// Inner join of all children. A cross product uses a `true` literal.
    Join { condition: Expr },
    Filter { predicate: Expr },
    Project { exprs: Vec<Expr>, aliases: Vec<String> },
    Sort { order: Vec<SortKey> },
    Limit { offset: Option<u64>, count: Option<u64> },
    /// Grouped aggregation. Modeled so its properties can be derived, but no
    /// built-in rule implements it.
    Aggregate {
        group_by: Vec<Expr>,
        aggregates: Vec<AggExpr>,
    },
}

/// Physical operators -- represent *how* to execute a computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOp {
    /// Sequential scan of every row of the table.
    TableScan { table: TableRef, rt_index: u32 },
    /// For each left row, scan all right rows. Works for any condition.
    NestedLoopJoin { condition: Expr },
    Filter { predicate: Expr },
    Projection { exprs: Vec<Expr>, aliases: Vec<String> },
    /// Materializes and sorts its input.
    Sort { order: Vec<SortKey> },
    Limit { offset: Option<u64>, count: Option<u64> },
}

/// Unified operator enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Logical(LogicalOp),
    Physical(PhysicalOp),
}

impl Operator {
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::Logical(_))
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Operator::Physical(_))
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operator::Logical(l) => OpKind::Logical(l.kind()),
            Operator::Physical(p) => OpKind::Physical(p.kind()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Logical(op) => match op {
                LogicalOp::Scan { table, rt_index } => {
                    write!(f, "LogicalScan({table}, rt={rt_index})")
                }
                LogicalOp::Join { condition } => write!(f, "LogicalJoin({condition})"),
                LogicalOp::Filter { predicate } => write!(f, "LogicalFilter({predicate})"),
                LogicalOp::Project { exprs, .. } => {
                    write!(f, "LogicalProject(")?;
                    write_list(f, exprs)?;
                    write!(f, ")")
                }
                LogicalOp::Sort { order } => write!(f, "LogicalSort({} keys)", order.len()),
                LogicalOp::Limit { offset, count } => {
                    write!(f, "LogicalLimit(")?;
                    write_limit(f, *offset, *count)?;
                    write!(f, ")")
                }
                LogicalOp::Aggregate {
                    group_by,
                    aggregates,
                } => write!(
                    f,
                    "LogicalAggregate({} keys, {} aggs)",
                    group_by.len(),
                    aggregates.len()
                ),
            },
            Operator::Physical(op) => match op {
                PhysicalOp::TableScan { table, rt_index } => {
                    write!(f, "TableScan({table}, rt={rt_index})")
                }
                PhysicalOp::NestedLoopJoin { condition } => {
                    write!(f, "NestedLoopJoin({condition})")
                }
                PhysicalOp::Filter { predicate } => write!(f, "Filter({predicate})"),
                PhysicalOp::Projection { exprs, .. } => {
                    write!(f, "Projection(")?;
                    write_list(f, exprs)?;
                    write!(f, ")")
                }
                PhysicalOp::Sort { order } => write!(f, "Sort({} keys)", order.len()),
                PhysicalOp::Limit { offset, count } => {
                    write!(f, "Limit(")?;
                    write_limit(f, *offset, *count)?;
                    write!(f, ")")
                }
            },
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{e}")?;
    }
    Ok(())
}

fn write_limit(f: &mut fmt::Formatter<'_>, offset: Option<u64>, count: Option<u64>) -> fmt::Result {
    match count {
        Some(c) => write!(f, "count={c}")?,
        None => write!(f, "count=all")?,
    }
    if let Some(o) = offset {
        write!(f, ", offset={o}")?;
    }
    Ok(())
}

/// Kind discriminant for pattern matching (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Logical(LogicalOpKind),
    Physical(PhysicalOpKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOpKind {
    Scan,
    Join,
    Filter,
    Project,
    Sort,
    Limit,
    Aggregate,
}

impl LogicalOp {
    pub fn kind(&self) -> LogicalOpKind {
        match self {
            LogicalOp::Scan { .. } => LogicalOpKind::Scan,
            LogicalOp::Join { .. } => LogicalOpKind::Join,
            LogicalOp::Filter { .. } => LogicalOpKind::Filter,
            LogicalOp::Project { .. } => LogicalOpKind::Project,
            LogicalOp::Sort { .. } => LogicalOpKind::Sort,
            LogicalOp::Limit { .. } => LogicalOpKind::Limit,
            LogicalOp::Aggregate { .. } => LogicalOpKind::Aggregate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOpKind {
    TableScan,
    NestedLoopJoin,
    Filter,
    Projection,
    Sort,
    Limit,
}

impl PhysicalOp {
    pub fn kind(&self) -> PhysicalOpKind {
        match self {
            PhysicalOp::TableScan { .. } => PhysicalOpKind::TableScan,
            PhysicalOp::NestedLoopJoin { .. } => PhysicalOpKind::NestedLoopJoin,
            PhysicalOp::Filter { .. } => PhysicalOpKind::Filter,
            PhysicalOp::Projection { .. } => PhysicalOpKind::Projection,
            PhysicalOp::Sort { .. } => PhysicalOpKind::Sort,
            PhysicalOp::Limit { .. } => PhysicalOpKind::Limit,
        }
    }
}

/// A node of the externally supplied operator tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorNode {
    pub op: Operator,
    #[serde(default)]
    pub inputs: Vec<OperatorNode>,
}

impl OperatorNode {
    pub fn new(op: Operator, inputs: Vec<OperatorNode>) -> Self {
        Self { op, inputs }
    }

    pub fn scan(table: TableRef, rt_index: u32) -> Self {
        Self::new(
            Operator::Logical(LogicalOp::Scan { table, rt_index }),
            vec![],
        )
    }

    pub fn filter(predicate: Expr, input: OperatorNode) -> Self {
        Self::new(
            Operator::Logical(LogicalOp::Filter { predicate }),
            vec![input],
        )
    }

    pub fn join(condition: Expr, left: OperatorNode, right: OperatorNode) -> Self {
        Self::new(
            Operator::Logical(LogicalOp::Join { condition }),
            vec![left, right],
        )
    }

    pub fn project(exprs: Vec<Expr>, input: OperatorNode) -> Self {
        Self::new(
            Operator::Logical(LogicalOp::Project {
                exprs,
                aliases: vec![],
            }),
            vec![input],
        )
    }

    pub fn sort(order: Vec<SortKey>, input: OperatorNode) -> Self {
        Self::new(Operator::Logical(LogicalOp::Sort { order }), vec![input])
    }

    pub fn limit(count: u64, input: OperatorNode) -> Self {
        Self::new(
            Operator::Logical(LogicalOp::Limit {
                offset: None,
                count: Some(count),
            }),
            vec![input],
        )
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.inputs);
        }
        count
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        for _ in 0..level {
            write!(f, "  ")?;
        }
        if level > 0 {
            write!(f, "-> ")?;
        }
        writeln!(f, "{}", self.op)?;
        for input in &self.inputs {
            input.render(f, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for OperatorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminants() {
        let scan = Operator::Logical(LogicalOp::Scan {
            table: TableRef::new("public", "t"),
            rt_index: 1,
        });
        assert!(scan.is_logical());
        assert_eq!(scan.kind(), OpKind::Logical(LogicalOpKind::Scan));

        let sort = Operator::Physical(PhysicalOp::Sort { order: vec![] });
        assert!(sort.is_physical());
        assert_eq!(sort.kind(), OpKind::Physical(PhysicalOpKind::Sort));
    }

    #[test]
    fn test_tree_render() {
        let tree = OperatorNode::limit(
            10,
            OperatorNode::scan(TableRef::new("public", "t"), 1),
        );
        assert_eq!(tree.size(), 2);
        let rendered = tree.to_string();
        assert_eq!(
            rendered,
            "LogicalLimit(count=10)\n  -> LogicalScan(public.t, rt=1)\n"
        );
    }

    #[test]
    fn test_expr_display() {
        let e = Expr::binary(BinaryOp::Gt, Expr::col("t", "a"), Expr::int(5));
        assert_eq!(e.to_string(), "(t.a > 5)");
    }
}
