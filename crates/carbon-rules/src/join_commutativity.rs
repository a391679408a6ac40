//! # Join Commutativity Rule
//!
//! Implements the identity `A JOIN B = B JOIN A` for inner joins, the only join
//! kind modeled here.
//!
//! ## Why Commutativity Matters
//!
//! A nested loop join's cost depends on which input is outer. Putting both
//! orientations in the same group lets the cost model choose.
//!
//! ## Termination
//!
//! Applying the rule to `B JOIN A` produces `A JOIN B`, which is already in the
//! memo. The memo returns the existing expression and the scheduler does not
//! optimize it again, so the rule fires at most twice per join.
//!
//! ## Condition Swapping
//!
//! `A.x = B.y` becomes `B.y = A.x` so the condition reads in child order. Other
//! predicates are kept as they are.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

/// Join commutativity: A JOIN B -> B JOIN A.
pub struct JoinCommutativityRule;

impl Rule for JoinCommutativityRule {
    fn name(&self) -> &str {
        "JoinCommutativity"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Transformation
    }

    fn pattern(&self) -> Pattern {
        Pattern::join()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Join { condition }) = &expr.op else {
            return vec![];
        };

        let &[left, right] = expr.children.as_slice() else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Logical(LogicalOp::Join {
                condition: swap_condition_sides(condition),
            }),
            vec![right, left],
        )]
    }
}

/// Swap the sides of an equi-join condition.
fn swap_condition_sides(expr: &Expr) -> Expr {
    match expr {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left,
            right,
        } => Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: right.clone(),
            right: left.clone(),
        },
        Expr::And(conjuncts) => Expr::And(conjuncts.iter().map(swap_condition_sides).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_condition() {
        let cond = Expr::binary(BinaryOp::Eq, Expr::col("a", "x"), Expr::col("b", "y"));
        match swap_condition_sides(&cond) {
            Expr::BinaryOp { left, right, .. } => {
                assert!(matches!(left.as_ref(), Expr::Column(c) if c.table.as_deref() == Some("b")));
                assert!(matches!(right.as_ref(), Expr::Column(c) if c.table.as_deref() == Some("a")));
            }
            other => panic!("Expected BinaryOp, got {other:?}"),
        }
        // swapping twice restores the original
        assert_eq!(swap_condition_sides(&swap_condition_sides(&cond)), cond);
    }

    #[test]
    fn test_children_swapped() {
        let mut memo = Memo::default();
        let tree = OperatorNode::join(
            Expr::binary(BinaryOp::Eq, Expr::col("a", "x"), Expr::col("b", "y")),
            OperatorNode::scan(TableRef::new("public", "a"), 1),
            OperatorNode::scan(TableRef::new("public", "b"), 2),
        );
        memo.init_memo(Some(&tree));

        let results = JoinCommutativityRule.apply(memo.expr(2), &memo);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].children, vec![1, 0]);
        assert!(results[0].op.is_logical());
    }
}
