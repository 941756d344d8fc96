//! Core types and error definitions for the AgentHaus skill engine.
//!
//! This crate provides the foundational types shared across all AgentHaus
//! crates: the unified error enum, the skill data model that flows between the
//! parser, dispatcher and splicer, and the records handed to persistence sinks.
//!
//! # Main types
//!
//! - [`HausError`]: Unified error enum for all AgentHaus subsystems.
//! - [`HausResult`]: Convenience alias for `Result<T, HausError>`.
//! - [`SkillDefinition`]: Immutable description of one agent capability.
//! - [`ParsedCommand`]: A command marker recognized in an agent reply.
//! - [`SkillResult`]: The outcome of dispatching one command.
//! - [`PendingConfirmation`]: A mutating command parked until its owner confirms.

/// Confirmation types for commands held back by the safety policy.
pub mod confirmation;
/// Records emitted to the persistence collaborator.
pub mod record;
/// Skill definitions, parsed commands and execution results.
pub mod skill;

pub use confirmation::{ConfirmationDecision, PendingConfirmation};
pub use record::{ActivityKind, ActivityRecord, TransactionKind, TransactionRecord, TransactionStatus};
pub use skill::{
    ParsedCommand, SkillCategory, SkillDefinition, SkillErrorKind, SkillExample, SkillOutput,
    SkillParam, SkillResult,
};

// --- Error types ---

/// Top-level error type for the AgentHaus engine.
///
/// Each variant corresponds to a failure class a subsystem can produce. The
/// dispatcher folds these into [`SkillErrorKind`] values so that no error
/// crosses the turn boundary as an abrupt control transfer.
#[derive(Debug, thiserror::Error)]
pub enum HausError {
    /// Malformed or missing command parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing wallet, credentials or other required configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// A spending limit or blocklist rule was breached.
    #[error("Safety violation: {0}")]
    Safety(String),

    /// A downstream operation (contract read, signing, submission) failed.
    #[error("Execution error: {0}")]
    Execution(String),

    /// A JSON-RPC transport or protocol failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// An error raised by a skill handler that fits no other class.
    #[error("Skill error: {0}")]
    Skill(String),

    /// A registry inconsistency or other defect that should be unreachable.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HausError {
    /// Classifies this error into the outcome kind reported to the agent.
    pub fn kind(&self) -> SkillErrorKind {
        match self {
            HausError::Validation(_) => SkillErrorKind::ValidationError,
            HausError::Config(_) => SkillErrorKind::ConfigurationError,
            HausError::Safety(_) => SkillErrorKind::SafetyViolation,
            HausError::Internal(_) => SkillErrorKind::Internal,
            HausError::Execution(_)
            | HausError::Rpc(_)
            | HausError::Skill(_)
            | HausError::Json(_)
            | HausError::Io(_) => SkillErrorKind::ExecutionError,
        }
    }
}

/// A convenience `Result` alias using [`HausError`].
pub type HausResult<T> = Result<T, HausError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            HausError::Validation("x".into()).kind(),
            SkillErrorKind::ValidationError
        );
        assert_eq!(
            HausError::Config("x".into()).kind(),
            SkillErrorKind::ConfigurationError
        );
        assert_eq!(
            HausError::Safety("x".into()).kind(),
            SkillErrorKind::SafetyViolation
        );
        assert_eq!(HausError::Rpc("x".into()).kind(), SkillErrorKind::ExecutionError);
        assert_eq!(HausError::Internal("x".into()).kind(), SkillErrorKind::Internal);
    }

    #[test]
    fn test_error_display() {
        let err = HausError::Rpc("eth_call failed".into());
        assert_eq!(err.to_string(), "RPC error: eth_call failed");
    }
}
