use thiserror::Error;

use crate::Symbol;

/// Invariant violations raised by the object model itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    #[error("method table full: capacity {capacity}, cannot add {selector}")]
    MethodTableFull { capacity: usize, selector: Symbol },

    #[error("unresolved variable {0}")]
    UnresolvedVariable(Symbol),

    #[error("the root world has no parent to commit into")]
    CommitRoot,

    #[error("invalid program: {0}")]
    InvalidProgram(String),
}
