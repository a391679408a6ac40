//! # carbon-core: Cascades Search Core
//!
//! This crate implements the data structures and the task-driven search of a
//! Cascades-style cost-based query optimizer.
//!
//! ## Module Overview
//!
//! - **`memo`**: The Memo table, which compactly represents every equivalent plan
//!   the search has found using groups and group expressions.
//! - **`expr`**: Scalar expressions, logical and physical operators, operator trees.
//! - **`column`**: The column registry and `ColSet` bitsets for output schemas.
//! - **`properties`**: Logical properties and their per-operator derivation.
//! - **`scheduler`**: The LIFO task stack that drives exploration and costing.
//! - **`optimizer`**: One-call facade: seed, search, extract.
//! - **`rule`**: The Rule trait and the ordered `RuleSet`.
//! - **`pattern`**: Kind-based pattern matching for rule applicability checks.
//! - **`cost`**: Cost model trait and the default weighted CPU/memory model.
//! - **`stats`**: Pluggable cardinality estimation.
//! - **`catalog`**: Catalog trait for table columns and row counts.
//! - **`config`**: Tunables for the default models.
//! - **`error`**: Why an optimization produced no plan.

pub mod catalog;
pub mod column;
pub mod config;
pub mod cost;
pub mod error;
pub mod expr;
pub mod memo;
pub mod optimizer;
pub mod pattern;
pub mod properties;
pub mod rule;
pub mod scheduler;
pub mod stats;

pub use error::OptimizeError;
pub use optimizer::Optimizer;
