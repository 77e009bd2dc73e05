// Central Error Type for evaluation and probing
//
// Callers of the boolean API never see these: every `check_*`/`evaluate*`
// collapses `Err(_)` to `false` after logging. The `try_*` forms return them.

use std::path::PathBuf;
use thiserror::Error;

/// Why a condition, a condition list or a probe could not be satisfied
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Fact store unavailable at {path}: {source}")]
    FactStoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed fact store at {path} (line {line}): {reason}")]
    MalformedFactStore {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Missing fact: {0}")]
    MissingFact(String),

    #[error("Not a number: {0:?}")]
    NotNumeric(String),

    #[error("Invalid operator {0}, please use LESS_THAN, GREATER_THAN, EQUAL or MATCH")]
    UnknownOperator(String),

    #[error("Unmanaged conditions parameter: {0}. It must be a script-language array")]
    UnrecognizedRepresentation(String),

    #[error("Invalid condition at index {index}: {reason}")]
    InvalidElement { index: usize, reason: String },

    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u128),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using EvalError
pub type Result<T> = std::result::Result<T, EvalError>;
