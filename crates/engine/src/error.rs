//! The module contains the errors the engine can throw.
//!
//! Errors fall in three families (see [`ErrorKind`]):
//!
//! - validation errors, returned when a command is malformed. The log is
//!   never modified when one of these is returned.
//! - [`InvariantViolation`], returned when a derived computation detects a
//!   defect (e.g. net balances not summing to zero).
//! - [`ConcurrentModification`], returned when an append lost the
//!   single-writer race. The caller should reload and retry.
//!
//!  [`InvariantViolation`]: EngineError::InvariantViolation
//!  [`ConcurrentModification`]: EngineError::ConcurrentModification
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Unknown member: {0}")]
    UnknownMember(String),
    #[error("Unknown group: {0}")]
    UnknownGroup(String),
    #[error("\"{member}\" is not a member of group \"{group}\"")]
    NotInGroup { member: String, group: String },
    #[error("Invalid void: {0}")]
    InvalidVoid(String),
    #[error("Unbalanced selection: {0}")]
    UnbalancedSelection(String),
    #[error("Payer and payee must differ: {0}")]
    SamePayerPayee(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Member in use: {0}")]
    MemberInUse(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Concurrent modification: expected log version {expected}, found {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },
    #[error("Store error: {0}")]
    Store(String),
}

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; surfaced to the user as-is.
    Validation,
    /// A defect in derived data. The computation was aborted.
    Invariant,
    /// Lost a compare-and-append race; retry after reloading.
    ConcurrentModification,
    /// The persistence port failed.
    Store,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvariantViolation(_) => ErrorKind::Invariant,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::Store(_) => ErrorKind::Store,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns `true` when retrying the same command may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            EngineError::InvalidSplit("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::InvariantViolation("x".to_string()).kind(),
            ErrorKind::Invariant
        );
        let race = EngineError::ConcurrentModification {
            expected: 1,
            actual: 2,
        };
        assert!(race.is_retryable());
        assert!(!EngineError::Store("disk".to_string()).is_retryable());
    }
}
