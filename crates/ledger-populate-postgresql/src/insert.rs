//! SQL generation and parameter binding for PostgreSQL.

use ledger_core::entity::{ColumnType, ID_COLUMN};
use ledger_core::{FieldValue, RowMutation, TableDefinition};
use tokio_postgres::types::ToSql;

/// PostgreSQL accepts at most this many bind parameters per statement.
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// Generate CREATE TABLE statement from a table definition.
pub fn generate_create_table(table: &TableDefinition) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("\"{}\" {} NOT NULL", c.name, pg_type(c.column_type)))
        .collect();

    format!(
        "CREATE TABLE \"{}\" ({}, PRIMARY KEY (\"{}\"))",
        table.name,
        columns.join(", "),
        table.primary_key
    )
}

/// Generate DROP TABLE statement.
pub fn generate_drop_table(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS \"{table_name}\"")
}

/// Generate the query that reads every id of a table, in key order.
pub fn generate_select_ids(table_name: &str) -> String {
    format!("SELECT \"{ID_COLUMN}\" FROM \"{table_name}\" ORDER BY \"{ID_COLUMN}\"")
}

/// Column list of a batch: the id, then the cells of the first row in order.
pub fn batch_columns(rows: &[RowMutation]) -> Vec<&'static str> {
    let mut columns = vec![ID_COLUMN];
    if let Some(first) = rows.first() {
        columns.extend(first.cells.iter().map(|(name, _)| *name));
    }
    columns
}

/// Generate a multi-row INSERT with numbered placeholders.
pub fn generate_insert(table_name: &str, columns: &[&str], row_count: usize) -> String {
    let col_count = columns.len();
    let mut param_idx = 1;
    let mut placeholders: Vec<String> = Vec::with_capacity(row_count);

    for _ in 0..row_count {
        let row_placeholders: Vec<String> = (0..col_count)
            .map(|_| {
                let p = format!("${param_idx}");
                param_idx += 1;
                p
            })
            .collect();
        placeholders.push(format!("({})", row_placeholders.join(", ")));
    }

    format!(
        "INSERT INTO \"{}\" ({}) VALUES {}",
        table_name,
        columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders.join(", ")
    )
}

/// Flatten the rows into bind parameters in `columns` order.
///
/// Returns the name of the first missing cell if a row does not match `columns`.
pub fn batch_params(
    rows: &[RowMutation],
    columns: &[&'static str],
) -> Result<Vec<Box<dyn ToSql + Sync + Send>>, String> {
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> =
        Vec::with_capacity(rows.len() * columns.len());

    for row in rows {
        params.push(Box::new(row.key));
        for column in &columns[1..] {
            let value = row
                .get(column)
                .ok_or_else(|| format!("row {} has no value for column {}", row.key, column))?;
            params.push(field_to_boxed(value));
        }
    }
    Ok(params)
}

fn field_to_boxed(value: &FieldValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        FieldValue::Int64(v) => Box::new(*v),
        FieldValue::Text(s) => Box::new(s.clone()),
        FieldValue::Timestamp(ts) => Box::new(*ts),
    }
}

fn pg_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Int64 => "BIGINT",
        ColumnType::String => "VARCHAR(2048)",
        ColumnType::Timestamp => "TIMESTAMPTZ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger_core::{Entity, EntityKind, Transaction};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&EntityKind::Transaction.table_definition());

        assert!(sql.starts_with("CREATE TABLE \"Transactions\" ("));
        assert!(sql.contains("\"Id\" BIGINT NOT NULL"));
        assert!(sql.contains("\"CompanyId\" BIGINT NOT NULL"));
        assert!(sql.contains("\"Time\" TIMESTAMPTZ NOT NULL"));
        assert!(sql.ends_with("PRIMARY KEY (\"Id\"))"));
    }

    #[test]
    fn test_generate_create_table_with_names() {
        let sql = generate_create_table(&EntityKind::User.table_definition());
        assert!(sql.contains("\"Name\" VARCHAR(2048) NOT NULL"));
        assert!(sql.contains("\"CreationTime\" TIMESTAMPTZ NOT NULL"));
    }

    #[test]
    fn test_generate_drop_table() {
        assert_eq!(
            generate_drop_table("Users"),
            "DROP TABLE IF EXISTS \"Users\""
        );
    }

    #[test]
    fn test_generate_select_ids() {
        assert_eq!(
            generate_select_ids("Users"),
            "SELECT \"Id\" FROM \"Users\" ORDER BY \"Id\""
        );
    }

    #[test]
    fn test_generate_insert_placeholders() {
        let sql = generate_insert("Users", &["Id", "Name"], 2);
        assert_eq!(
            sql,
            "INSERT INTO \"Users\" (\"Id\", \"Name\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_batch_columns_and_params() {
        let now = Utc::now();
        let rows: Vec<RowMutation> = (0..3)
            .map(|i| {
                Transaction {
                    id: 100 + i,
                    company_id: 1,
                    from_user_id: 2,
                    to_user_id: 3,
                    time: now,
                }
                .to_mutation(now)
            })
            .collect();

        let columns = batch_columns(&rows);
        assert_eq!(
            columns,
            vec!["Id", "CompanyId", "FromUserId", "ToUserId", "Time"]
        );

        let params = batch_params(&rows, &columns).unwrap();
        assert_eq!(params.len(), 15);
    }

    #[test]
    fn test_batch_params_missing_cell() {
        let now = Utc::now();
        let rows = vec![
            RowMutation::new(1, now).set("Name", FieldValue::Text("a".to_string())),
            RowMutation::new(2, now),
        ];
        let columns = batch_columns(&rows);

        let err = batch_params(&rows, &columns).err().unwrap();
        assert_eq!(err, "row 2 has no value for column Name");
    }
}
