//! PostgreSQL implementation of the store capability.

use crate::error::{to_store_error, PostgreSQLStoreError};
use crate::insert::{
    batch_columns, batch_params, generate_create_table, generate_drop_table, generate_insert,
    generate_select_ids, MAX_BIND_PARAMETERS,
};
use async_trait::async_trait;
use ledger_core::{BulkApplyResult, RowMutation, Store, StoreError, TableDefinition};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info};

/// Relational store backed by a single PostgreSQL connection.
///
/// A bulk apply is one `INSERT` statement, so it either writes every row or
/// none of them and never reports per-row failures.
pub struct PostgreSQLStore {
    client: Arc<Mutex<Client>>,
}

impl PostgreSQLStore {
    /// Connect to PostgreSQL.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - PostgreSQL connection string (e.g., "host=localhost user=postgres password=postgres dbname=ledger")
    pub async fn connect(connection_string: &str) -> Result<Self, PostgreSQLStoreError> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

        // Spawn the connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        // Test connection
        client.simple_query("SELECT 1").await?;

        Ok(Self::with_client(Arc::new(Mutex::new(client))))
    }

    /// Create a store over an existing client.
    pub fn with_client(client: Arc<Mutex<Client>>) -> Self {
        Self { client }
    }

    /// Drop the given tables if they exist.
    pub async fn drop_tables(&self, tables: &[TableDefinition]) -> Result<(), PostgreSQLStoreError> {
        let client = self.client.lock().await;
        for table in tables {
            info!("Dropping table: {}", table.name);
            client.execute(&generate_drop_table(&table.name), &[]).await?;
        }
        Ok(())
    }

    async fn select_ids(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        let sql = generate_select_ids(table);
        let client = self.client.lock().await;
        let rows = client
            .query(&sql, &[])
            .await
            .map_err(|e| to_store_error(&e, table))?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, i64>(0)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl Store for PostgreSQLStore {
    fn name(&self) -> &str {
        "postgresql"
    }

    async fn create_schema(&self, tables: &[TableDefinition]) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        for table in tables {
            let sql = generate_create_table(table);
            info!("Creating table: {}", table.name);
            debug!("DDL: {}", sql);
            client
                .execute(&sql, &[])
                .await
                .map_err(|e| to_store_error(&e, &table.name))?;
        }
        Ok(())
    }

    async fn bulk_apply(&self, table: &str, batch: Vec<RowMutation>) -> BulkApplyResult {
        if batch.is_empty() {
            return BulkApplyResult::ok();
        }

        let columns = batch_columns(&batch);
        let params = match batch_params(&batch, &columns) {
            Ok(params) => params,
            Err(reason) => {
                return BulkApplyResult::failed(StoreError::Unavailable(format!(
                    "malformed batch for '{table}': {reason}"
                )))
            }
        };
        if params.len() > MAX_BIND_PARAMETERS {
            return BulkApplyResult::failed(StoreError::Unavailable(format!(
                "batch for '{table}' needs {} parameters, limit is {MAX_BIND_PARAMETERS}",
                params.len()
            )));
        }

        let sql = generate_insert(table, &columns, batch.len());
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let client = self.client.lock().await;
        match client.execute(&sql, &param_refs).await {
            Ok(inserted) => {
                debug!("Inserted {} rows into '{}'", inserted, table);
                BulkApplyResult::ok()
            }
            Err(e) => BulkApplyResult::failed(to_store_error(&e, table)),
        }
    }

    async fn scan_all_keys(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        self.select_ids(table).await
    }

    fn supports_sql(&self) -> bool {
        true
    }

    async fn query_ids(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        self.select_ids(table).await
    }

    fn max_cells_per_call(&self) -> Option<usize> {
        Some(MAX_BIND_PARAMETERS)
    }
}
