//! Error types for Gateflow.
//!
//! All errors in Gateflow are represented by the `GateflowError` enum.
//! The first three variants are the resolution taxonomy surfaced by the
//! activity runtime; the rest cover the engine around it.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Gateflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum GateflowError {
    /// A flow was decided twice, a lifecycle transition was illegal, or a
    /// snapshot was captured or restored outside its valid window.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// No default flow exists and no conditional flow evaluated true.
    #[error("no conditional flow taken from activity {activity}")]
    NoConditionalFlowTaken {
        activity: String,
    },

    /// The condition evaluator failed.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Engine-level errors (configuration, lock poisoning, missing processes).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Process lifecycle errors.
    #[error("{0}")]
    Process(String),

    /// Process model definition errors.
    #[error("{0}")]
    Workflow(String),

    /// Activity definition errors.
    #[error("{0}")]
    Activity(String),

    /// Sequence flow definition errors.
    #[error("{0}")]
    Flow(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl GateflowError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        GateflowError::InvariantViolation(msg.into())
    }

    /// Whether the error is fatal for the activity that raised it.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            GateflowError::InvariantViolation(_) | GateflowError::NoConditionalFlowTaken { .. } | GateflowError::Evaluation(_)
        )
    }
}

impl From<GateflowError> for String {
    fn from(val: GateflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for GateflowError {
    fn from(error: std::io::Error) -> Self {
        GateflowError::IoError(error.to_string())
    }
}

impl From<GateflowError> for std::io::Error {
    fn from(val: GateflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for GateflowError {
    fn from(error: serde_json::Error) -> Self {
        GateflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for GateflowError {
    fn from(error: toml::de::Error) -> Self {
        GateflowError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for GateflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        GateflowError::Workflow(error.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for GateflowError {
    fn from(error: std::sync::PoisonError<T>) -> Self {
        GateflowError::Engine(format!("lock poisoned: {}", error))
    }
}
