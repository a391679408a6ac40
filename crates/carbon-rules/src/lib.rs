//! # Built-in Optimization Rules
//!
//! This crate provides the default rule set for the carbon search core.
//!
//! ## Transformation Rules (Logical -> Logical)
//!
//! - **`JoinCommutativityRule`**: Swaps the sides of a join (A JOIN B -> B JOIN A).
//!   Memo deduplication stops the swap from undoing itself forever.
//!
//! ## Implementation Rules (Logical -> Physical)
//!
//! Each maps one logical kind to its physical counterpart, copying the operator's
//! parameters and child groups unchanged:
//!
//! - **`ImplTableScanRule`**: Scan -> TableScan.
//! - **`ImplFilterRule`**: Filter -> Filter.
//! - **`ImplSortRule`**: Sort -> Sort.
//! - **`ImplLimitRule`**: Limit -> Limit.
//! - **`ImplProjectionRule`**: Project -> Projection.
//! - **`ImplNestedLoopJoinRule`**: Join -> NestedLoopJoin.
//!
//! Aggregate has no implementation rule, so a plan containing one has no
//! physical alternative.

pub mod impl_filter;
pub mod impl_join;
pub mod impl_limit;
pub mod impl_project;
pub mod impl_scan;
pub mod impl_sort;
pub mod join_commutativity;

use carbon_core::rule::RuleSet;

/// Create the default rule set with all built-in rules.
///
/// Order matters only for tie-breaking: the first registered matching rule
/// fires first.
pub fn default_rule_set() -> RuleSet {
    RuleSet::new(vec![
        // Transformation rules: expand the logical search space.
        Box::new(join_commutativity::JoinCommutativityRule),
        // Implementation rules: map logical operators to physical alternatives.
        Box::new(impl_scan::ImplTableScanRule),
        Box::new(impl_filter::ImplFilterRule),
        Box::new(impl_sort::ImplSortRule),
        Box::new(impl_limit::ImplLimitRule),
        Box::new(impl_project::ImplProjectionRule),
        Box::new(impl_join::ImplNestedLoopJoinRule),
    ])
}
