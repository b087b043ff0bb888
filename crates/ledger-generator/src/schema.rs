//! Table creation ahead of generation.

use ledger_core::{DatagenError, EntityKind, Store, TableDefinition};
use std::sync::Arc;
use tracing::info;

/// Creates the Companies, Users, and Transactions tables.
pub struct SchemaInitializer {
    store: Arc<dyn Store>,
}

impl SchemaInitializer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Definitions of every ledger table, in creation order.
    pub fn table_definitions() -> Vec<TableDefinition> {
        EntityKind::ALL
            .iter()
            .map(|kind| kind.table_definition())
            .collect()
    }

    pub async fn create_tables(&self) -> Result<(), DatagenError> {
        let tables = Self::table_definitions();
        info!(
            "Creating {} tables on {}",
            tables.len(),
            self.store.name()
        );
        self.store
            .create_schema(&tables)
            .await
            .map_err(|e| DatagenError::unavailable("Creating schema", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::StoreError;
    use ledger_populate_memory::MemoryStore;

    #[tokio::test]
    async fn test_create_tables() {
        let store = Arc::new(MemoryStore::new());
        SchemaInitializer::new(store.clone())
            .create_tables()
            .await
            .unwrap();

        assert_eq!(
            store.table_names(),
            vec!["Companies", "Transactions", "Users"]
        );
    }

    #[tokio::test]
    async fn test_create_tables_twice_fails() {
        let store = Arc::new(MemoryStore::new());
        let schema = SchemaInitializer::new(store);
        schema.create_tables().await.unwrap();

        let result = schema.create_tables().await;
        assert!(matches!(
            result,
            Err(DatagenError::Unavailable {
                source: StoreError::TableExists(_),
                ..
            })
        ));
    }
}
