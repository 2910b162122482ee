//! Error handling for microtab operations
//!
//! All failures are local validation failures surfaced synchronously to the
//! caller; nothing is retried internally and no partial state is left behind
//! (contexts and expression trees are immutable once built).

use thiserror::Error;

/// Result type alias for microtab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for microtab operations
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of positional or key arguments
    #[error("{0}")]
    Arity(String),

    /// A group-by key expression carries no row-varying information
    #[error("group-by does not work with constant arguments: {0}")]
    InvalidKeyExpression(String),

    /// Mutually exclusive options were both supplied
    #[error("cannot use both {0} and {1} arguments")]
    ConflictingArguments(&'static str, &'static str),

    /// An unrecognized keyword name was passed to a vectorized function
    #[error("got an unexpected keyword argument '{0}'")]
    UnknownArgument(String),

    /// A variable name is not present in the evaluation context
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// An effective filter expression does not type-check as boolean
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        actual: String,
    },

    /// A filter was supplied to a reduction over data of more than one dimension
    #[error("filter argument is not supported on arrays with more than 1 dimension")]
    UnsupportedFilterRank,

    /// A context column does not have the context's row count
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    ColumnLength {
        /// Column name
        name: String,
        /// Context row count
        expected: usize,
        /// Offending column length
        actual: usize,
    },

    /// General evaluation failure
    #[error("{0}")]
    Operation(String),
}

impl Error {
    /// Create a general operation error with a custom message
    pub fn operation(msg: impl Into<String>) -> Self {
        Error::Operation(msg.into())
    }

    /// Arity error for a call exceeding a function's declared parameter count
    #[must_use]
    pub fn too_many_args(max: usize, given: usize) -> Self {
        Error::Arity(format!("takes at most {max} arguments ({given} given)"))
    }

    /// Arity error for a call missing required arguments
    pub fn missing_args(msg: impl Into<String>) -> Self {
        Error::Arity(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_convention() {
        let err = Error::too_many_args(2, 3);
        assert_eq!(err.to_string(), "takes at most 2 arguments (3 given)");
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnknownArgument("frobnicate".into());
        assert_eq!(
            err.to_string(),
            "got an unexpected keyword argument 'frobnicate'"
        );

        let err = Error::UnknownVariable("age".into());
        assert_eq!(err.to_string(), "unknown variable 'age'");

        let err = Error::TypeMismatch {
            expected: "bool",
            actual: "float".into(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected bool, got float");

        let err = Error::ConflictingArguments("explicit_labels", "axes");
        assert_eq!(
            err.to_string(),
            "cannot use both explicit_labels and axes arguments"
        );
    }
}
