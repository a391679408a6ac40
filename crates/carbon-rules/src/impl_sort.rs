//! # Sort Implementation Rule
//!
//! Maps a logical Sort (an ORDER BY) to a physical Sort that materializes its
//! input. There are no required physical properties in this search, so an
//! explicit logical Sort is the only way a Sort enters the plan.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

/// Implement logical sort as a physical sort operator.
pub struct ImplSortRule;

impl Rule for ImplSortRule {
    fn name(&self) -> &str {
        "ImplSort"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::sort()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Sort { order }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::Sort {
                order: order.clone(),
            }),
            expr.children.clone(),
        )]
    }
}
