//! # Join Implementation Rule
//!
//! ## Nested Loop Join (`ImplNestedLoopJoinRule`)
//!
//! For each left row, scans all right rows. Always applicable: it works with any
//! join condition, including non-equi predicates and cross products, but its
//! O(n * m) cost makes the side order matter. Join commutativity puts both
//! orientations in the group and the cost model keeps the cheaper one.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

/// Implement logical join as a nested loop join.
pub struct ImplNestedLoopJoinRule;

impl Rule for ImplNestedLoopJoinRule {
    fn name(&self) -> &str {
        "ImplNestedLoopJoin"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::join()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Join { condition }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::NestedLoopJoin {
                condition: condition.clone(),
            }),
            expr.children.clone(),
        )]
    }
}
