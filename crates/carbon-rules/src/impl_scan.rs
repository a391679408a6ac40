//! # Scan Implementation Rule
//!
//! Maps a logical Scan to a physical TableScan, a full read of every row. The
//! table and range-table index are copied unchanged, so the executor sees the
//! same relation the binder resolved.

use carbon_core::expr::*;
use carbon_core::memo::{Memo, MemoExpr};
use carbon_core::pattern::Pattern;
use carbon_core::rule::{Rule, RuleResult, RuleType};

/// Implement logical scan as a sequential table scan.
pub struct ImplTableScanRule;

impl Rule for ImplTableScanRule {
    fn name(&self) -> &str {
        "ImplTableScan"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::scan()
    }

    fn apply(&self, expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
        let Operator::Logical(LogicalOp::Scan { table, rt_index }) = &expr.op else {
            return vec![];
        };

        vec![RuleResult::new(
            Operator::Physical(PhysicalOp::TableScan {
                table: table.clone(),
                rt_index: *rt_index,
            }),
            vec![],
        )]
    }
}
