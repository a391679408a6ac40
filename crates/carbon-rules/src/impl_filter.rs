//! Filter implementation rule.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

/// Implement a logical filter as a physical filter over the same input group.
pub struct ImplFilterRule;

impl Rule for ImplFilterRule {
    fn name(&self) -> &str {
        "ImplFilter"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::filter()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Filter { predicate }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::Filter {
                predicate: predicate.clone(),
            }),
            expr.children.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_predicate_and_child() {
        let mut memo = Memo::default();
        let predicate = Expr::binary(BinaryOp::Gt, Expr::col("t", "a"), Expr::int(5));
        let tree = OperatorNode::filter(
            predicate.clone(),
            OperatorNode::scan(TableRef::new("public", "t"), 1),
        );
        let root = memo.init_memo(Some(&tree)).unwrap_or_default();
        let filter = memo.group(root).logical_exprs[0];

        let results = ImplFilterRule.apply(memo.expr(filter), &memo);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].op,
            Operator::Physical(PhysicalOp::Filter { predicate })
        );
        assert_eq!(results[0].children, vec![0]);
    }
}
