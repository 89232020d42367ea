//! Engine boundary errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised at the engine boundary. Engine rejections are carried
/// verbatim and never retried.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine reported an error for a command.
    #[error("Engine rejected '{command}': {message}")]
    Rejected { command: String, message: String },

    /// Engine output could not be interpreted.
    #[error("Unparseable engine output for '{command}': {detail}")]
    Parse { command: String, detail: String },

    /// An element query did not report the requested attribute.
    #[error("Element '{element}' has no attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A per-element listing did not line up with the element names.
    #[error("Listing '{who}' returned {found} values for {expected} elements")]
    Shape {
        who: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to start engine '{program}'")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// The engine process exited or closed its pipes.
    #[error("Engine process closed: {what}")]
    Closed { what: String },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}
