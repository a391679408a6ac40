//! End-to-end optimization of single-table pipelines.
//!
//! These tests build the operator trees a host translator would hand over for a
//! `SELECT ... FROM t WHERE ... ORDER BY ... LIMIT ...` query, run the optimizer
//! with the built-in rules and check the chosen plan, its properties and the
//! columns the outbound translator would see.

use carbon_core::catalog::{ColumnDef, InMemoryCatalog};
use carbon_core::column::{ColSet, Column};
use carbon_core::config::OptimizerConfig;
use carbon_core::expr::*;
use carbon_core::memo::PlanNode;
use carbon_core::{OptimizeError, Optimizer};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    catalog.add_table(
        &TableRef::new("public", "t"),
        vec![
            ColumnDef::new("a", 1),
            ColumnDef::new("b", 2),
            ColumnDef::dropped("legacy", 3),
            ColumnDef::new("c", 4),
        ],
        1000.0,
    );
    catalog
}

fn optimizer() -> Optimizer {
    Optimizer::new(
        Arc::new(carbon_rules::default_rule_set()),
        Arc::new(catalog()),
        OptimizerConfig::default(),
    )
}

fn scan_t() -> OperatorNode {
    OperatorNode::scan(TableRef::new("public", "t"), 1)
}

/// `SELECT a, b + 1 FROM t WHERE a > 5 ORDER BY a LIMIT 10`
fn pipeline() -> OperatorNode {
    OperatorNode::project(
        vec![
            Expr::col("t", "a"),
            Expr::binary(BinaryOp::Add, Expr::col("t", "b"), Expr::int(1)),
        ],
        OperatorNode::limit(
            10,
            OperatorNode::sort(
                vec![SortKey::asc(Expr::col("t", "a"))],
                OperatorNode::filter(
                    Expr::binary(BinaryOp::Gt, Expr::col("t", "a"), Expr::int(5)),
                    scan_t(),
                ),
            ),
        ),
    )
}

fn kind_chain(plan: &PlanNode) -> Vec<PhysicalOpKind> {
    let mut kinds = vec![plan.op.kind()];
    let mut node = plan;
    while let Some(child) = node.children.first() {
        kinds.push(child.op.kind());
        node = child;
    }
    kinds
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_plan_shape() {
    let mut optimizer = optimizer();
    let plan = optimizer
        .optimize(Some(&pipeline()))
        .expect("pipeline should have a plan");

    assert_eq!(
        kind_chain(&plan),
        vec![
            PhysicalOpKind::Projection,
            PhysicalOpKind::Limit,
            PhysicalOpKind::Sort,
            PhysicalOpKind::Filter,
            PhysicalOpKind::TableScan,
        ]
    );
    assert_eq!(plan.size(), 5);
    println!("{}", plan.display(0));
}

#[test]
fn test_pipeline_cardinalities() {
    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&pipeline())).expect("plan");

    let limit = &plan.children[0];
    let sort = &limit.children[0];
    let filter = &sort.children[0];
    let scan = &filter.children[0];

    assert_eq!(scan.props.cardinality(), 1000.0);
    assert_eq!(filter.props.cardinality(), 500.0);
    assert_eq!(sort.props.cardinality(), 500.0);
    assert_eq!(limit.props.cardinality(), 10.0);
    assert_eq!(plan.props.cardinality(), 10.0);
}

#[test]
fn test_pipeline_output_columns() {
    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&pipeline())).expect("plan");
    let memo = optimizer.memo();

    // three live table columns, then one fresh column per projected expression
    let scan = &plan.children[0].children[0].children[0].children[0];
    assert_eq!(scan.props.output_columns(), &[0, 1, 2].into_iter().collect::<ColSet>());
    assert_eq!(plan.props.output_columns(), &[3, 4].into_iter().collect::<ColSet>());

    let targets = memo.target_list(plan.group).expect("root has properties");
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().all(|(_, c)| matches!(c, Column::Expr { .. })));

    let scan_targets = memo.target_list(scan.group).expect("scan has properties");
    let attnums: Vec<u32> = scan_targets
        .iter()
        .filter_map(|(_, c)| match c {
            Column::Table { attnum, .. } => Some(*attnum),
            Column::Expr { .. } => None,
        })
        .collect();
    assert_eq!(attnums, vec![1, 2, 4]);
}

#[test]
fn test_costs_accumulate_up_the_plan() {
    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&pipeline())).expect("plan");

    let mut node = &plan;
    while let Some(child) = node.children.first() {
        assert!(child.cost < node.cost, "{} !< {}", child.cost.total, node.cost.total);
        node = child;
    }
    // the scan reads every row once
    assert_eq!(node.cost.total, 1000.0);
}

#[test]
fn test_scan_only() {
    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&scan_t())).expect("plan");
    assert_eq!(
        plan.op,
        PhysicalOp::TableScan {
            table: TableRef::new("public", "t"),
            rt_index: 1,
        }
    );
    assert!(plan.children.is_empty());
}

#[test]
fn test_empty_tree_has_no_plan() {
    let mut optimizer = optimizer();
    assert!(optimizer.optimize(None).is_none());
    assert_eq!(
        optimizer.try_optimize(None).err(),
        Some(OptimizeError::EmptyOperatorTree)
    );
}

#[test]
fn test_aggregate_has_no_plan() {
    let mut optimizer = optimizer();
    let tree = OperatorNode::project(
        vec![Expr::col("t", "a")],
        OperatorNode::new(
            Operator::Logical(LogicalOp::Aggregate {
                group_by: vec![Expr::col("t", "a")],
                aggregates: vec![AggExpr {
                    func: AggFunc::Count,
                    arg: Expr::col("t", "b"),
                    distinct: false,
                }],
            }),
            vec![scan_t()],
        ),
    );

    assert!(optimizer.optimize(Some(&tree)).is_none());
    assert!(matches!(
        optimizer.try_optimize(Some(&tree)),
        Err(OptimizeError::NoPhysicalAlternative { .. })
    ));

    // the scan below the aggregate was explored, but nothing asked for its cost
    let memo = optimizer.memo();
    assert!(memo.group(0).explored);
    assert_eq!(memo.group(0).physical_exprs.len(), 1);
    assert!(memo.group(0).winner.is_none());
    assert!(memo.group(1).physical_exprs.is_empty());
    assert!(memo.group(2).winner.is_none());
}

#[test]
fn test_config_changes_limit_bound() {
    let config = OptimizerConfig {
        limit_rows: 3.0,
        ..OptimizerConfig::default()
    };
    let mut optimizer = Optimizer::new(
        Arc::new(carbon_rules::default_rule_set()),
        Arc::new(catalog()),
        config,
    );
    let plan = optimizer.optimize(Some(&pipeline())).expect("plan");
    assert_eq!(plan.props.cardinality(), 3.0);
}

#[test]
fn test_plan_serializes() {
    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&pipeline())).expect("plan");
    let json = serde_json::to_value(&plan).expect("plan serializes");
    assert_eq!(json["group"], 4);
    assert!(json["op"]["Projection"].is_object());
    assert_eq!(json["children"][0]["op"]["Limit"]["count"], 10);
}

#[test]
fn test_deep_filter_chain_extracts_without_recursion() {
    const DEPTH: usize = 1000;
    let mut tree = scan_t();
    for i in 0..DEPTH {
        tree = OperatorNode::filter(
            Expr::binary(BinaryOp::Gt, Expr::col("t", "a"), Expr::int(i as i64)),
            tree,
        );
    }
    assert_eq!(tree.size(), DEPTH + 1);

    let mut optimizer = optimizer();
    let plan = optimizer.optimize(Some(&tree)).expect("deep plan");
    assert_eq!(plan.size(), DEPTH + 1);
    assert_eq!(plan.op.kind(), PhysicalOpKind::Filter);
    assert_eq!(plan.display(0).lines().count(), DEPTH + 1);

    let mut node = &plan;
    while let Some(child) = node.children.first() {
        node = child;
    }
    assert_eq!(node.op.kind(), PhysicalOpKind::TableScan);
    assert_eq!(node.group, 0);
}
