//! # Rule System
//!
//! This module defines the rule trait and the rule set that drive the search.
//!
//! ## Rule Types
//!
//! - **Transformation rules** (`RuleType::Transformation`): rewrite a logical
//!   operator into an equivalent logical operator in the same group, e.g. join
//!   commutativity (A JOIN B -> B JOIN A).
//! - **Implementation rules** (`RuleType::Implementation`): map a logical operator
//!   to a physical one, e.g. a logical Scan to a TableScan. These produce the
//!   candidates that get costed.
//!
//! The scheduler treats both alike: each result is attached to the group of the
//! expression the rule fired on, and whether it is logical or physical decides
//! what is scheduled next.
//!
//! ## Rule Sets
//!
//! A `RuleSet` is an ordered, immutable list built once and shared through an
//! `Arc`. Registration order is observable: matching rules are pushed onto the
//! task stack in reverse, so the first registered rule runs first.

use crate::expr::Operator;
use crate::memo::{ExprId, GroupId, Memo, MemoExpr};
use crate::pattern::{matches, Pattern};

/// Classification of optimization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// Logical → Logical transformation (e.g., join commutativity).
    Transformation,
    /// Logical → Physical implementation (e.g., scan → table scan).
    Implementation,
}

/// Result of applying a rule: a new expression for the same group, referencing
/// existing child groups.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult {
    pub op: Operator,
    pub children: Vec<GroupId>,
}

impl RuleResult {
    pub fn new(op: Operator, children: Vec<GroupId>) -> Self {
        Self { op, children }
    }
}

/// A rule transforms or implements expressions. Rules hold no per-query state.
pub trait Rule: Send + Sync {
    /// Unique name of this rule.
    fn name(&self) -> &str;

    /// Whether this rule is a transformation or implementation rule.
    fn rule_type(&self) -> RuleType;

    /// Pattern that this rule matches against.
    fn pattern(&self) -> Pattern;

    /// Apply the rule to a matching expression.
    ///
    /// Must not mutate the memo; the scheduler attaches the results.
    fn apply(&self, expr: &MemoExpr, memo: &Memo) -> Vec<RuleResult>;
}

/// Ordered collection of rules.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn get(&self, index: usize) -> Option<&dyn Rule> {
        self.rules.get(index).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Indices of the rules whose pattern matches `expr_id`, in registration order.
    pub fn matching(&self, memo: &Memo, expr_id: ExprId) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| matches(memo, expr_id, &rule.pattern()))
            .map(|(i, _)| i)
            .collect()
    }
}

impl FromIterator<Box<dyn Rule>> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn Rule>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{LogicalOpKind, OperatorNode, TableRef};
    use crate::pattern::OpMatcher;

    struct Named(&'static str, LogicalOpKind);

    impl Rule for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn rule_type(&self) -> RuleType {
            RuleType::Implementation
        }

        fn pattern(&self) -> Pattern {
            Pattern::Operator(OpMatcher::LogicalOp(self.1), vec![])
        }

        fn apply(&self, _expr: &MemoExpr, _memo: &Memo) -> Vec<RuleResult> {
            vec![]
        }
    }

    #[test]
    fn test_matching_keeps_registration_order() {
        let rules = RuleSet::new(vec![
            Box::new(Named("first", LogicalOpKind::Scan)),
            Box::new(Named("other", LogicalOpKind::Join)),
            Box::new(Named("second", LogicalOpKind::Scan)),
        ]);
        let mut memo = Memo::default();
        memo.init_memo(Some(&OperatorNode::scan(TableRef::new("public", "t"), 1)));

        assert_eq!(rules.matching(&memo, 0), vec![0, 2]);
        assert_eq!(rules.get(2).map(|r| r.name()), Some("second"));
        assert_eq!(rules.len(), 3);
        assert!(RuleSet::empty().matching(&memo, 0).is_empty());
    }
}
