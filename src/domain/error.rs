//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Violations of the hierarchy model.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("node is not visible: {0}")]
    HiddenNode(String),

    #[error("node has no children: {0}")]
    NotExpandable(String),

    #[error("no records form a tree")]
    EmptyHierarchy,
}

pub type DomainResult<T> = Result<T, DomainError>;
