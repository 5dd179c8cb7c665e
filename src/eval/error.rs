// src/eval/error.rs
//
// Error taxonomy for the evaluation harness.
//
// - EvalError: fatal for the whole run (config load, report persistence).
// - ExecutionError: local to one scenario x language pair; the executor
//   turns it into a zero-score failed result and keeps going.

use thiserror::Error;

/// Fatal errors. Any of these ends the run with a non-zero exit status.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read evaluation config '{path}': {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse evaluation config '{path}': {source}")]
    ConfigParse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("evaluation config validation error in '{field}': {message}")]
    ConfigInvalid { field: String, message: String },
    #[error("failed to write report '{path}': {source}")]
    ReportWrite {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode report '{path}': {source}")]
    ReportEncode {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to read report '{path}': {source}")]
    ReportRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode report '{path}': {source}")]
    ReportDecode {
        path: String,
        source: serde_json::Error,
    },
}

impl EvalError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while simulating a single scenario x language pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("tool backend error in {tool}: {message}")]
    ToolBackend { tool: String, message: String },
    #[error("scenario timed out after {seconds}s")]
    Timeout { seconds: u64 },
}
