//! Projection implementation rule.
//!
//! The physical projection evaluates the same expression list, in the same order,
//! so the output columns registered for the logical group line up one-to-one
//! with its target entries.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

pub struct ImplProjectionRule;

impl Rule for ImplProjectionRule {
    fn name(&self) -> &str {
        "ImplProjection"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::project()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Project { exprs, aliases }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::Projection {
                exprs: exprs.clone(),
                aliases: aliases.clone(),
            }),
            expr.children.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_keeps_aliases() {
        let mut memo = Memo::default();
        let exprs = vec![
            Expr::col("t", "a"),
            Expr::binary(BinaryOp::Add, Expr::col("t", "b"), Expr::int(1)),
        ];
        let aliases = vec!["a".to_string(), "b_plus_one".to_string()];
        let tree = OperatorNode::new(
            Operator::Logical(LogicalOp::Project {
                exprs: exprs.clone(),
                aliases: aliases.clone(),
            }),
            vec![OperatorNode::scan(TableRef::new("public", "t"), 1)],
        );
        memo.init_memo(Some(&tree));

        let results = ImplProjectionRule.apply(memo.expr(1), &memo);
        assert_eq!(
            results,
            vec![RuleResult::new(
                Operator::Physical(PhysicalOp::Projection { exprs, aliases }),
                vec![0],
            )]
        );
    }
}
