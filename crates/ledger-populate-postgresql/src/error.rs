//! Error types for the PostgreSQL store.

use ledger_core::StoreError;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Errors that can occur while connecting to or administering PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgreSQLStoreError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),
}

/// Map a driver error onto the store error taxonomy.
pub fn to_store_error(err: &tokio_postgres::Error, table: &str) -> StoreError {
    match err.code() {
        Some(code) if *code == SqlState::UNDEFINED_TABLE => {
            StoreError::TableNotFound(table.to_string())
        }
        Some(code) if *code == SqlState::DUPLICATE_TABLE => {
            StoreError::TableExists(table.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}
