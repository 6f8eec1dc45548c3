//! Error types for firewall operations.

use thiserror::Error;

use crate::stack::CallerInfo;

/// Errors raised by guarded objects and the firewall facade.
#[derive(Debug, Clone, Error)]
pub enum FirewallError {
    /// The caller's source location is not covered by the policy.
    #[error("Access denied for {operation} from {}", describe_caller(.caller.as_ref()))]
    AccessDenied {
        /// Label of the denied operation (a property name or a fixed description).
        operation: String,
        /// The resolved caller, if the call site could be identified.
        caller: Option<CallerInfo>,
    },
    /// Malformed input to the facade.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The default semantics of an operation could not be applied.
    #[error("type error: {0}")]
    TypeError(String),
    /// Error raised by a native function body.
    #[error("{0}")]
    Thrown(String),
}

impl FirewallError {
    /// Create an error to be raised from a native function body.
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }

    /// Returns true if this error is an access denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

fn describe_caller(caller: Option<&CallerInfo>) -> String {
    match caller {
        Some(caller) => caller.to_string(),
        None => "<unknown>".to_string(),
    }
}

/// Result type for firewall operations.
pub type FirewallResult<T> = Result<T, FirewallError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn access_denied_message_embeds_location() {
        let err = FirewallError::AccessDenied {
            operation: "calling function".to_string(),
            caller: Some(CallerInfo {
                file: PathBuf::from("/work/libs/other/index.rs"),
                line: 12,
                column: 5,
            }),
        };

        assert_eq!(
            err.to_string(),
            "Access denied for calling function from /work/libs/other/index.rs:12:5"
        );
        assert!(err.is_access_denied());
    }

    #[test]
    fn access_denied_without_caller() {
        let err = FirewallError::AccessDenied {
            operation: "prop1".to_string(),
            caller: None,
        };

        assert_eq!(err.to_string(), "Access denied for prop1 from <unknown>");
    }

    #[test]
    fn thrown_is_not_a_denial() {
        let err = FirewallError::thrown("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_access_denied());
    }
}
