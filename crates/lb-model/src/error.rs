//! Error types for the lb-model layer.

use std::path::PathBuf;

/// Model error type wrapping catalog and engine errors and adding the
/// lookup, validation and state failures of the cache itself.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] lb_catalog::CatalogError),

    #[error("Invalid model config: {what}")]
    Config { what: String },

    #[error("Failed to read model config: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("No lattice mapping for control name: {name}")]
    UnmappedName { name: String },

    #[error("Variable is read-only: {name}")]
    ReadOnly { name: String },

    #[error("Rejected value for {name}: {reason}")]
    OutOfRange { name: String, reason: String },

    #[error("Variable has not been initialized: {name}")]
    Uninitialized { name: String },

    #[error("Cannot convert {name}: {reason}")]
    Conversion { name: String, reason: String },

    #[error("Missing station status flag: {pv}")]
    StatusFlagMissing { pv: String },

    #[error("Engine error: {0}")]
    Engine(#[from] lb_engine::EngineError),
}

/// Result type for lb-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Whether the error comes from an unknown or unmapped name.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            ModelError::UnknownVariable { .. } | ModelError::UnmappedName { .. }
        )
    }
}
