use miette::Diagnostic;
use thiserror::Error;

/// Failures surfaced by every ledger operation.
///
/// The first seven variants are the stable signals callers branch on. The
/// remaining ones are unexpected faults; callers should treat them as opaque.
#[derive(Error, Debug, Diagnostic)]
pub enum LedgerError {
    #[error("No authenticated caller")]
    #[diagnostic(code(workledger::unauthenticated))]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    #[diagnostic(code(workledger::forbidden))]
    Forbidden(String),

    #[error("{entity} {id} not found")]
    #[diagnostic(code(workledger::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(workledger::invalid_argument))]
    InvalidArgument(String),

    #[error("Invalid transition: {0}")]
    #[diagnostic(code(workledger::invalid_transition))]
    InvalidTransition(String),

    #[error("Duplicate: {0}")]
    #[diagnostic(code(workledger::duplicate))]
    Duplicate(String),

    #[error("Expired: {0}")]
    #[diagnostic(code(workledger::expired))]
    Expired(String),

    #[error("CSV error: {0}")]
    #[diagnostic(code(workledger::csv))]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(workledger::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(workledger::serialization))]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    #[diagnostic(code(workledger::storage))]
    Storage(#[from] rocksdb::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(workledger::internal))]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable short name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Duplicate(_) => "duplicate",
            Self::Expired(_) => "expired",
            _ => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable_per_variant() {
        assert_eq!(LedgerError::Unauthenticated.kind(), "unauthenticated");
        assert_eq!(LedgerError::not_found("job", 7).kind(), "not_found");
        assert_eq!(LedgerError::Expired("late".into()).kind(), "expired");
        assert_eq!(LedgerError::Internal("boom".into()).kind(), "internal");
    }

    #[test]
    fn test_not_found_message() {
        let err = LedgerError::not_found("payment", "abc");
        assert_eq!(err.to_string(), "payment abc not found");
    }
}
