//! Error types for sqlmapper

use thiserror::Error;

/// Result type alias for sqlmapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Error types for statement injection and rendering
#[derive(Debug, Error)]
pub enum MapperError {
    /// By-id statement requested for a table without a primary key (bootstrap)
    #[error("Table '{table}' has no primary key column; cannot inject '{method}'")]
    MissingKeyColumn { table: String, method: String },

    /// Version-guarded statement requested for a table without a version column (bootstrap)
    #[error("Table '{table}' has no version column; cannot inject '{method}'")]
    MissingVersionColumn { table: String, method: String },

    /// Condition wrapper classification is inconsistent or ambiguous
    #[error("Invalid wrapper state: {0}")]
    InvalidWrapperState(String),

    /// UPDATE rendered with zero SET assignments
    #[error("Statement '{statement}' rendered an empty SET clause")]
    EmptySetFragment { statement: String },

    /// INSERT rendered with zero columns
    #[error("Statement '{statement}' rendered no insert columns")]
    EmptyInsert { statement: String },

    /// UPDATE/DELETE rendered without any WHERE predicate
    #[error("Statement '{statement}' has no WHERE clause and unfiltered writes are disabled")]
    UnfilteredWrite { statement: String },

    /// A required per-call binding was not supplied
    #[error("Statement '{statement}' requires binding '{name}'")]
    MissingBinding { statement: String, name: String },

    /// Entity payload is not a property map
    #[error("Invalid entity payload: {0}")]
    InvalidPayload(String),

    /// Table metadata violates an invariant
    #[error("Invalid table metadata: {0}")]
    InvalidMetadata(String),

    /// Identifier failed validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Payload could not be converted to a record
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Statement or table lookup failed
    #[error("Unknown statement: {0}")]
    UnknownStatement(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl MapperError {
    /// Create a missing key column error
    pub fn missing_key(table: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MissingKeyColumn {
            table: table.into(),
            method: method.into(),
        }
    }

    /// Create a missing version column error
    pub fn missing_version(table: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MissingVersionColumn {
            table: table.into(),
            method: method.into(),
        }
    }

    /// Create an invalid wrapper state error
    pub fn invalid_wrapper(message: impl Into<String>) -> Self {
        Self::InvalidWrapperState(message.into())
    }

    /// Create an invalid metadata error
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata(message.into())
    }

    /// Create an invalid payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_ident(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Check if this error is raised while injecting statements, before any call site runs
    pub fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            Self::MissingKeyColumn { .. }
                | Self::MissingVersionColumn { .. }
                | Self::InvalidMetadata(_)
                | Self::InvalidIdentifier(_)
                | Self::Config(_)
        )
    }

    /// Check if this is an empty SET error
    pub fn is_empty_set(&self) -> bool {
        matches!(self, Self::EmptySetFragment { .. })
    }

    /// Check if this is an invalid wrapper state error
    pub fn is_invalid_wrapper(&self) -> bool {
        matches!(self, Self::InvalidWrapperState(_))
    }
}
