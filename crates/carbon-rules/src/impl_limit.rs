//! Limit implementation rule.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

pub struct ImplLimitRule;

impl Rule for ImplLimitRule {
    fn name(&self) -> &str {
        "ImplLimit"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::limit()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Limit { offset, count }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::Limit {
                offset: *offset,
                count: *count,
            }),
            expr.children.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_count_copied() {
        let mut memo = Memo::default();
        let tree = OperatorNode::new(
            Operator::Logical(LogicalOp::Limit {
                offset: Some(20),
                count: None,
            }),
            vec![OperatorNode::scan(TableRef::new("public", "t"), 1)],
        );
        memo.init_memo(Some(&tree));

        let results = ImplLimitRule.apply(memo.expr(1), &memo);
        assert_eq!(
            results[0].op,
            Operator::Physical(PhysicalOp::Limit {
                offset: Some(20),
                count: None,
            })
        );
    }
}
