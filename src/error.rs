//! Error types for the interactive learning loop
//!
//! The loop distinguishes fatal contract breaches (a selection strategy
//! returning an illegal index) from reported statistical degeneracies
//! (a correction set with zero label variance). Collaborator failures are
//! propagated unmodified; nothing is retried.

use std::fmt;

/// Result type alias for loop operations
pub type CaipiResult<T> = Result<T, CaipiError>;

/// Error type for the interactive loop and its drivers
#[derive(Debug, Clone, PartialEq)]
pub enum CaipiError {
    /// A query strategy selected an index outside the legal candidate set.
    /// This is fatal; it indicates a strategy bug, not a recoverable state.
    ContractViolation { index: usize, context: String },

    /// All accumulated correction labels are identical, so a model cannot
    /// be fit on corrections alone. Reported, never fatal at the run level.
    DegenerateCorrections { label: usize },

    /// A collection that must be non-empty was empty
    EmptyCollection { collection: String },

    /// A train/known/test/eval partition violated its preconditions
    InvalidPartition { context: String, details: String },

    /// Invalid configuration parameter
    InvalidConfig { parameter: String, details: String },

    /// I/O failure while writing logs or reading configuration
    Io { details: String },
}

impl fmt::Display for CaipiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaipiError::ContractViolation { index, context } => {
                write!(
                    f,
                    "Contract violation in {}: selected index {} is outside the legal candidate set",
                    context, index
                )
            }
            CaipiError::DegenerateCorrections { label } => {
                write!(
                    f,
                    "Degenerate correction set: every correction carries label {}",
                    label
                )
            }
            CaipiError::EmptyCollection { collection } => {
                write!(f, "Empty collection: {}", collection)
            }
            CaipiError::InvalidPartition { context, details } => {
                write!(f, "Invalid partition {}: {}", context, details)
            }
            CaipiError::InvalidConfig { parameter, details } => {
                write!(f, "Invalid configuration for '{}': {}", parameter, details)
            }
            CaipiError::Io { details } => {
                write!(f, "IO error: {}", details)
            }
        }
    }
}

impl std::error::Error for CaipiError {}

impl From<std::io::Error> for CaipiError {
    fn from(value: std::io::Error) -> Self {
        CaipiError::Io {
            details: value.to_string(),
        }
    }
}

// Convenience constructors for common error patterns
impl CaipiError {
    /// Create a contract violation error for an illegal query index
    pub fn contract_violation(index: usize, context: impl Into<String>) -> Self {
        CaipiError::ContractViolation {
            index,
            context: context.into(),
        }
    }

    /// Create a degenerate-corrections error
    pub fn degenerate_corrections(label: usize) -> Self {
        CaipiError::DegenerateCorrections { label }
    }

    /// Create an empty collection error
    pub fn empty_collection(collection: impl Into<String>) -> Self {
        CaipiError::EmptyCollection {
            collection: collection.into(),
        }
    }

    /// Create an invalid partition error
    pub fn invalid_partition(context: impl Into<String>, details: impl Into<String>) -> Self {
        CaipiError::InvalidPartition {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(parameter: impl Into<String>, details: impl Into<String>) -> Self {
        CaipiError::InvalidConfig {
            parameter: parameter.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_display() {
        let err = CaipiError::contract_violation(17, "query selection");
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("query selection"));
    }

    #[test]
    fn test_degenerate_corrections_display() {
        let err = CaipiError::degenerate_corrections(1);
        assert!(err.to_string().contains("label 1"));
    }

    #[test]
    fn test_empty_collection_display() {
        let err = CaipiError::empty_collection("query candidates");
        assert!(err.to_string().contains("query candidates"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CaipiError = io_err.into();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CaipiError::contract_violation(3, "test");
        let err2 = CaipiError::contract_violation(3, "test");
        let err3 = CaipiError::contract_violation(4, "test");

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CaipiError>();
    }
}
