use crate::memo::GroupId;
use thiserror::Error;

/// Why an optimization produced no plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error("empty operator tree")]
    EmptyOperatorTree,

    #[error("no physical alternative for group {group}")]
    NoPhysicalAlternative { group: GroupId },
}
