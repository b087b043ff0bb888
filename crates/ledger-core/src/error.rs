//! Error types for data generation and store access.

use crate::entity::EntityKind;
use crate::multi_error::MultiError;
use thiserror::Error;

/// Errors reported by a [`crate::Store`] adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Network failure, interrupted scan, exhausted quota, or any other backend-side failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The table has not been created.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The table already exists.
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// A single row within a bulk apply was rejected.
    #[error("Row {key} rejected: {reason}")]
    RowRejected { key: i64, reason: String },

    /// The backend does not offer this operation.
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

/// Errors that can occur while generating and loading data.
#[derive(Error, Debug)]
pub enum DatagenError {
    /// Malformed bucket, range, or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A store call failed as a whole.
    #[error("{operation} failed: {source}")]
    Unavailable {
        operation: String,
        #[source]
        source: StoreError,
    },

    /// Transactions were requested before any row of `kind` existed.
    #[error("No {kind} available to reference; {kind} must be generated before transactions")]
    EmptyReferencePool { kind: EntityKind },

    /// One or more rows of a bulk apply failed.
    #[error("Bulk apply to '{table}' failed for bucket [{start}, {end}): {source}")]
    PartialBatchFailure {
        table: String,
        start: i64,
        end: i64,
        #[source]
        source: MultiError<StoreError>,
    },

    /// The run was cancelled before `stage` could start or finish.
    #[error("Cancelled during {stage}")]
    Cancelled { stage: String },

    /// Error reading the configuration file or writing progress output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing the configuration file.
    #[error("Failed to parse config: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),
}

impl DatagenError {
    pub fn unavailable(operation: impl Into<String>, source: StoreError) -> Self {
        DatagenError::Unavailable {
            operation: operation.into(),
            source,
        }
    }
}
