//! Error types for the decision core

use thiserror::Error;

use crate::PolicyId;

/// Core error type for agent operations
///
/// Only [`AgentError::CorruptSnapshot`] is fatal, and only at startup:
/// learning on top of a half-parsed table would poison every later update.
/// Per-tick anomalies degrade to logged no-ops in the controller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A chosen policy id is not present in the registry
    #[error("unknown policy: {0}")]
    UnknownPolicy(PolicyId),

    /// A required numeric field was absent from the observation
    #[error("malformed observation: missing field `{field}`")]
    MalformedObservation {
        /// Name of the missing field
        field: &'static str,
    },

    /// The value-table snapshot could not be parsed at startup
    #[error("corrupt snapshot `{path}`: {reason}")]
    CorruptSnapshot {
        /// Path of the snapshot file
        path: String,
        /// What failed to parse
        reason: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
