//! Dispatch-layer error kinds
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial error taxonomy for registry, router and materializer

use thiserror::Error;

/// Failures raised by the command layer itself.
///
/// Handler and hook code returns `anyhow::Result`; these variants travel inside
/// an `anyhow::Error` and can be recovered with `downcast_ref::<CommandError>()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Payload broke a protocol guarantee (empty sub-command group, missing resolved target)
    #[error("malformed interaction payload: {0}")]
    MalformedPayload(String),

    /// Remote calls were attempted before `init` fixed the application id
    #[error("application id is not set; call init() once the gateway is ready")]
    MissingApplicationId,

    #[error("unknown option type: {0}")]
    UnknownOptionType(u8),

    #[error("unknown command type: {0}")]
    UnknownCommandType(u8),

    /// Command or option name rejected by the naming rule
    #[error("invalid name '{0}': must be 1-32 lowercase characters, digits, '-' or '_'")]
    InvalidName(String),

    /// Group labels used where the protocol cannot nest them
    #[error("invalid grouping: {0}")]
    InvalidGrouping(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_downcasts_through_anyhow() {
        let err: anyhow::Error = CommandError::MissingApplicationId.into();
        assert_eq!(
            err.downcast_ref::<CommandError>(),
            Some(&CommandError::MissingApplicationId)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CommandError::UnknownOptionType(42).to_string(),
            "unknown option type: 42"
        );
        assert!(CommandError::MalformedPayload("no sub-command".into())
            .to_string()
            .contains("no sub-command"));
    }
}
