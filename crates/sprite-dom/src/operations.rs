//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found in the arena
    #[error("node {0:?} not found")]
    NotFound(NodeId),

    /// Hierarchy error (e.g. inserting an ancestor into its descendant)
    #[error("hierarchy request error")]
    HierarchyRequest,

    /// Reference node is not a child of the given parent
    #[error("node is not a child")]
    NotAChild,

    /// Operation needs an element (or container) node
    #[error("invalid node type")]
    InvalidNodeType,

    /// Selector could not be parsed
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),
}
