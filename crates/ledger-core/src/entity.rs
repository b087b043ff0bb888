//! Entity records and the row mutations they are written as.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column family used by wide-column stores. Kept short because it is repeated in every cell.
pub const DEFAULT_COLUMN_FAMILY: &str = "cf";

/// Primary key column shared by every table.
pub const ID_COLUMN: &str = "Id";
pub const NAME_COLUMN: &str = "Name";
pub const CREATION_TIME_COLUMN: &str = "CreationTime";
pub const COMPANY_ID_COLUMN: &str = "CompanyId";
pub const FROM_USER_ID_COLUMN: &str = "FromUserId";
pub const TO_USER_ID_COLUMN: &str = "ToUserId";
pub const TIME_COLUMN: &str = "Time";

/// The three kinds of entity the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    User,
    Transaction,
}

impl EntityKind {
    /// All kinds in generation order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Company, EntityKind::User, EntityKind::Transaction];

    /// Name of the table that stores this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Company => "Companies",
            EntityKind::User => "Users",
            EntityKind::Transaction => "Transactions",
        }
    }

    /// Table definition for this kind, including the primary key column.
    pub fn table_definition(&self) -> TableDefinition {
        let columns = match self {
            EntityKind::Company | EntityKind::User => vec![
                ColumnDefinition::new(ID_COLUMN, ColumnType::Int64),
                ColumnDefinition::new(NAME_COLUMN, ColumnType::String),
                ColumnDefinition::new(CREATION_TIME_COLUMN, ColumnType::Timestamp),
            ],
            EntityKind::Transaction => vec![
                ColumnDefinition::new(ID_COLUMN, ColumnType::Int64),
                ColumnDefinition::new(COMPANY_ID_COLUMN, ColumnType::Int64),
                ColumnDefinition::new(FROM_USER_ID_COLUMN, ColumnType::Int64),
                ColumnDefinition::new(TO_USER_ID_COLUMN, ColumnType::Int64),
                ColumnDefinition::new(TIME_COLUMN, ColumnType::Timestamp),
            ],
        };
        TableDefinition {
            name: self.table_name().to_string(),
            primary_key: ID_COLUMN,
            columns,
            column_family: DEFAULT_COLUMN_FAMILY,
        }
    }

    /// Number of columns written per row, primary key included.
    pub fn column_count(&self) -> usize {
        match self {
            EntityKind::Company | EntityKind::User => 3,
            EntityKind::Transaction => 5,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Company => write!(f, "companies"),
            EntityKind::User => write!(f, "users"),
            EntityKind::Transaction => write!(f, "transactions"),
        }
    }
}

/// Column value types understood by every store adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    String,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// Table layout handed to [`crate::Store::create_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub primary_key: &'static str,
    /// All columns, primary key first.
    pub columns: Vec<ColumnDefinition>,
    /// Only meaningful to wide-column stores.
    pub column_family: &'static str,
}

impl TableDefinition {
    /// Column names excluding the primary key, in declaration order.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(move |c| c.name != self.primary_key)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int64(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// One row write: a primary key, its non-key cells, and the write timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMutation {
    pub key: i64,
    pub cells: Vec<(&'static str, FieldValue)>,
    pub timestamp: DateTime<Utc>,
}

impl RowMutation {
    pub fn new(key: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            key,
            cells: Vec::new(),
            timestamp,
        }
    }

    pub fn set(mut self, column: &'static str, value: FieldValue) -> Self {
        self.cells.push((column, value));
        self
    }

    /// Get a cell value by column name.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

/// A generated record that can be written as a [`RowMutation`].
pub trait Entity {
    /// Kind of the record; selects the table it is written to.
    const KIND: EntityKind;

    /// Build the mutation for this record, stamped with `written_at`.
    fn to_mutation(&self, written_at: DateTime<Utc>) -> RowMutation;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub creation_time: DateTime<Utc>,
}

impl Entity for Company {
    const KIND: EntityKind = EntityKind::Company;

    fn to_mutation(&self, written_at: DateTime<Utc>) -> RowMutation {
        RowMutation::new(self.id, written_at)
            .set(NAME_COLUMN, FieldValue::Text(self.name.clone()))
            .set(
                CREATION_TIME_COLUMN,
                FieldValue::Timestamp(self.creation_time),
            )
    }
}

/// A user. `name` follows the generation index while `id` is random; the two are unrelated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub creation_time: DateTime<Utc>,
}

impl User {
    /// Display name for the user generated at `index`.
    pub fn name_for_index(index: i64) -> String {
        format!("User-{index}")
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn to_mutation(&self, written_at: DateTime<Utc>) -> RowMutation {
        RowMutation::new(self.id, written_at)
            .set(NAME_COLUMN, FieldValue::Text(self.name.clone()))
            .set(
                CREATION_TIME_COLUMN,
                FieldValue::Timestamp(self.creation_time),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub company_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub time: DateTime<Utc>,
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn to_mutation(&self, written_at: DateTime<Utc>) -> RowMutation {
        RowMutation::new(self.id, written_at)
            .set(COMPANY_ID_COLUMN, FieldValue::Int64(self.company_id))
            .set(FROM_USER_ID_COLUMN, FieldValue::Int64(self.from_user_id))
            .set(TO_USER_ID_COLUMN, FieldValue::Int64(self.to_user_id))
            .set(TIME_COLUMN, FieldValue::Timestamp(self.time))
    }
}
