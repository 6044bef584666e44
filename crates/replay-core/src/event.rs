//! Change events read from the source change log.
//!
//! Each event is one variant of a closed enum, so consumers handle every kind
//! with a single exhaustive `match`. Row images keep the column order the
//! source produced (the column ordinal in the source row).

use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A table, optionally qualified with the database it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Database (schema) name, when the change log records it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Table name
    pub name: String,
}

impl TableRef {
    /// Create an unqualified table reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            name: name.into(),
        }
    }

    /// Create a table reference qualified with its database.
    pub fn qualified(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{db}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Ordered column → value mapping.
///
/// Serialized as a JSON array of `[column, value]` pairs so that column order
/// survives a round trip through the change log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowImage(Vec<(String, SqlValue)>);

impl RowImage {
    /// Create an empty row image.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a column, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.0.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.0.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for RowImage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One entry of the source change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A row was inserted; `values` is the new row.
    RowInsert { table: TableRef, values: RowImage },

    /// A row was updated; `before` is the old row and `after` the new one.
    RowUpdate {
        table: TableRef,
        before: RowImage,
        after: RowImage,
    },

    /// A row was deleted; `values` is the old row.
    RowDelete { table: TableRef, values: RowImage },

    /// A statement logged verbatim (DDL, or statement-based replication).
    SchemaStatement {
        /// Database the statement was issued in
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database: Option<String>,
        statement: String,
    },

    /// Transaction boundary without data.
    TransactionMarker,
}

/// Discriminant of a [`ChangeEvent`], for logging and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RowInsert,
    RowUpdate,
    RowDelete,
    SchemaStatement,
    TransactionMarker,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RowInsert => "INSERT",
            Self::RowUpdate => "UPDATE",
            Self::RowDelete => "DELETE",
            Self::SchemaStatement => "QUERY",
            Self::TransactionMarker => "XID",
        };
        f.write_str(name)
    }
}

impl ChangeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RowInsert { .. } => EventKind::RowInsert,
            Self::RowUpdate { .. } => EventKind::RowUpdate,
            Self::RowDelete { .. } => EventKind::RowDelete,
            Self::SchemaStatement { .. } => EventKind::SchemaStatement,
            Self::TransactionMarker => EventKind::TransactionMarker,
        }
    }

    /// The table a row event applies to; `None` for statements and markers.
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Self::RowInsert { table, .. }
            | Self::RowUpdate { table, .. }
            | Self::RowDelete { table, .. } => Some(table),
            Self::SchemaStatement { .. } | Self::TransactionMarker => None,
        }
    }
}
