//! # Declarative Pattern Matching for Rules
//!
//! Each rule declares a `Pattern` describing the shape of expressions it can
//! handle. The scheduler checks the pattern before scheduling the rule, so
//! `apply()` is only ever called on matching expressions.
//!
//! ## Pattern Language
//!
//! - `Pattern::Operator(matcher, children)`: matches an expression whose operator
//!   satisfies `matcher` and whose children match the given child patterns.
//! - `Pattern::Any`: matches any child group. This is the most common child pattern.
//! - `Pattern::Leaf`: matches only expressions with no children.
//!
//! ## Group-Level Matching
//!
//! When a child pattern is not `Any`, a child group matches if *any* of its
//! expressions (logical or physical) matches. All expressions in a group are
//! logically equivalent, so one witness is enough.

use crate::expr::{LogicalOpKind, Operator, PhysicalOpKind};
use crate::memo::{ExprId, Memo};

/// Pattern for matching expressions in the memo.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Match an operator with child patterns.
    Operator(OpMatcher, Vec<Pattern>),
    /// Match any subtree (group).
    Any,
    /// Match a leaf node (no children).
    Leaf,
}

/// Matcher for operator kinds (without data).
#[derive(Debug, Clone)]
pub enum OpMatcher {
    LogicalOp(LogicalOpKind),
    PhysicalOp(PhysicalOpKind),
    AnyLogical,
    AnyPhysical,
}

impl OpMatcher {
    pub fn matches(&self, op: &Operator) -> bool {
        match (op, self) {
            (Operator::Logical(l), OpMatcher::LogicalOp(kind)) => l.kind() == *kind,
            (Operator::Physical(p), OpMatcher::PhysicalOp(kind)) => p.kind() == *kind,
            (Operator::Logical(_), OpMatcher::AnyLogical) => true,
            (Operator::Physical(_), OpMatcher::AnyPhysical) => true,
            _ => false,
        }
    }
}

impl Pattern {
    /// A logical operator of `kind` over one wildcard child.
    pub fn unary(kind: LogicalOpKind) -> Self {
        Pattern::Operator(OpMatcher::LogicalOp(kind), vec![Pattern::Any])
    }

    /// Match a logical scan.
    pub fn scan() -> Self {
        Pattern::Operator(OpMatcher::LogicalOp(LogicalOpKind::Scan), vec![])
    }

    /// Match a logical join with two any-children.
    pub fn join() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Join),
            vec![Pattern::Any, Pattern::Any],
        )
    }

    pub fn filter() -> Self {
        Self::unary(LogicalOpKind::Filter)
    }

    pub fn project() -> Self {
        Self::unary(LogicalOpKind::Project)
    }

    pub fn sort() -> Self {
        Self::unary(LogicalOpKind::Sort)
    }

    pub fn limit() -> Self {
        Self::unary(LogicalOpKind::Limit)
    }
}

/// Check if a memo expression matches a pattern.
///
/// Unknown expression ids never match.
pub fn matches(memo: &Memo, expr_id: ExprId, pattern: &Pattern) -> bool {
    let Some(expr) = memo.get_expr(expr_id) else {
        return false;
    };
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => expr.children.is_empty(),
        Pattern::Operator(matcher, child_patterns) => {
            if !matcher.matches(&expr.op) {
                return false;
            }

            if expr.children.len() != child_patterns.len() {
                return false;
            }

            expr.children
                .iter()
                .zip(child_patterns)
                .all(|(&child_gid, child_pattern)| match child_pattern {
                    Pattern::Any => true,
                    _ => memo.get_group(child_gid).is_some_and(|group| {
                        group
                            .logical_exprs
                            .iter()
                            .chain(&group.physical_exprs)
                            .any(|&eid| matches(memo, eid, child_pattern))
                    }),
                })
        }
    }
}
