//! DOM tree error types

use thiserror::Error;

/// DOM tree operation result type
pub type TreeResult<T> = Result<T, TreeError>;

/// DOM tree errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} is no longer part of the document")]
    NodeNotFound(u32),

    #[error("cannot insert node {child} into node {parent}: the new child contains the parent")]
    HierarchyRequest { parent: u32, child: u32 },

    #[error("'{0}' is not a valid attribute name")]
    InvalidCharacter(String),

    #[error("node {0} is not an element")]
    InvalidNodeType(u32),
}
