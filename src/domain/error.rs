//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent missing-data failures in graph building and
/// date inference. Each variant names the offending handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("root family not found: {0}")]
    RootFamilyNotFound(String),

    #[error("family queued without visit data: {0}")]
    MissingQueuedFamily(String),

    #[error("family not present in document: {0}")]
    FamilyNotInDocument(String),

    #[error("can't find source person {person} in family {family}")]
    SourcePersonNotInFamily { family: String, person: String },

    #[error("no birth date could be derived for person: {0}")]
    MissingBirth(String),

    #[error("no data with which to place marriage of family: {0}")]
    NoMarriageEvidence(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
