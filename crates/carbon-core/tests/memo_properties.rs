//! Logical property propagation through a seeded memo.
//!
//! These tests only seed the memo; no rules run. They check the output column
//! sets and cardinalities each logical kind derives from its children.

use carbon_core::catalog::{ColumnDef, InMemoryCatalog};
use carbon_core::column::{ColSet, Column};
use carbon_core::config::OptimizerConfig;
use carbon_core::expr::*;
use carbon_core::memo::Memo;
use carbon_core::properties::LogicalProperties;
use carbon_core::stats::DefaultCardinalityModel;
use std::sync::Arc;

fn memo() -> Memo {
    let mut catalog = InMemoryCatalog::new();
    catalog.add_table(
        &TableRef::new("public", "t"),
        vec![
            ColumnDef::new("a", 1),
            ColumnDef::dropped("gone", 2),
            ColumnDef::new("b", 3),
        ],
        800.0,
    );
    catalog.add_table(
        &TableRef::new("public", "u"),
        vec![ColumnDef::new("x", 1)],
        40.0,
    );
    Memo::new(
        Arc::new(catalog),
        Arc::new(DefaultCardinalityModel::default()),
    )
}

fn props(memo: &Memo, group: u32) -> LogicalProperties {
    memo.group(group)
        .props
        .clone()
        .expect("logical group has properties")
}

#[test]
fn test_unary_operators_pass_columns_through() {
    let mut memo = memo();
    let tree = OperatorNode::limit(
        5,
        OperatorNode::sort(
            vec![SortKey::asc(Expr::col("t", "a"))],
            OperatorNode::filter(
                Expr::binary(BinaryOp::Lt, Expr::col("t", "b"), Expr::int(3)),
                OperatorNode::scan(TableRef::new("public", "t"), 1),
            ),
        ),
    );
    let root = memo.init_memo(Some(&tree));
    assert_eq!(root, Some(3));

    let scan = props(&memo, 0);
    assert_eq!(scan.output_columns(), &[0, 1].into_iter().collect::<ColSet>());
    assert_eq!(scan.cardinality(), 800.0);

    for group in 1..=3 {
        assert_eq!(props(&memo, group).output_columns(), scan.output_columns());
    }
    assert_eq!(props(&memo, 1).cardinality(), 400.0);
    assert_eq!(props(&memo, 2).cardinality(), 400.0);
    // the limit bound ignores both the count and the input size
    assert_eq!(props(&memo, 3).cardinality(), 10.0);
}

#[test]
fn test_project_registers_fresh_columns() {
    let mut memo = memo();
    let tree = OperatorNode::project(
        vec![Expr::col("t", "a"), Expr::col("t", "a"), Expr::int(7)],
        OperatorNode::scan(TableRef::new("public", "t"), 1),
    );
    let root = memo.init_memo(Some(&tree)).expect("root");

    let project = props(&memo, root);
    // even a repeated expression gets its own id
    assert_eq!(project.output_columns(), &[2, 3, 4].into_iter().collect::<ColSet>());
    assert_eq!(project.cardinality(), 800.0);
    assert_eq!(memo.columns().len(), 5);
    assert!(matches!(memo.column(4), Some(Column::Expr { .. })));
}

#[test]
fn test_join_unions_children() {
    let mut memo = memo();
    let tree = OperatorNode::join(
        Expr::binary(BinaryOp::Eq, Expr::col("t", "a"), Expr::col("u", "x")),
        OperatorNode::scan(TableRef::new("public", "t"), 1),
        OperatorNode::scan(TableRef::new("public", "u"), 2),
    );
    let root = memo.init_memo(Some(&tree)).expect("root");

    let join = props(&memo, root);
    assert_eq!(join.output_columns(), &[0, 1, 2].into_iter().collect::<ColSet>());
    assert_eq!(join.cardinality(), 1000.0);
    assert!(props(&memo, 0).output_columns().is_subset(join.output_columns()));
    assert!(props(&memo, 1).output_columns().is_subset(join.output_columns()));
}

#[test]
fn test_same_table_twice_stays_distinct() {
    let mut memo = memo();
    let tree = OperatorNode::join(
        Expr::Literal(ScalarValue::Bool(true)),
        OperatorNode::scan(TableRef::new("public", "t"), 1),
        OperatorNode::scan(TableRef::new("public", "t"), 2),
    );
    memo.init_memo(Some(&tree));
    assert_eq!(memo.num_groups(), 3);
    assert_eq!(memo.columns().len(), 4);
}

#[test]
fn test_identical_subtrees_share_a_group() {
    let mut memo = memo();
    let scan = OperatorNode::scan(TableRef::new("public", "u"), 1);
    let tree = OperatorNode::join(
        Expr::Literal(ScalarValue::Bool(true)),
        scan.clone(),
        scan,
    );
    let root = memo.init_memo(Some(&tree)).expect("root");
    assert_eq!(memo.num_groups(), 2);
    assert_eq!(memo.expr(memo.group(root).logical_exprs[0]).children, vec![0, 0]);
}

#[test]
fn test_configured_cardinality_model() {
    let config = OptimizerConfig {
        filter_selectivity: 0.25,
        default_table_rows: 64.0,
        ..OptimizerConfig::default()
    };
    let mut memo = Memo::new(
        Arc::new(InMemoryCatalog::new()),
        Arc::new(DefaultCardinalityModel::from_config(&config)),
    );
    let tree = OperatorNode::filter(
        Expr::int(1),
        OperatorNode::scan(TableRef::new("public", "unknown"), 1),
    );
    memo.init_memo(Some(&tree));
    assert_eq!(props(&memo, 0).cardinality(), 64.0);
    assert_eq!(props(&memo, 0).output_columns(), &ColSet::new());
    assert_eq!(props(&memo, 1).cardinality(), 16.0);
}
