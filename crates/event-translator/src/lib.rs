//! Change event → SQL statement translation.
//!
//! [`translate`] is a pure function: it performs no I/O and keeps no state.
//! Row events become parameterized statements whose values travel only in
//! the parameter list; identifiers are backtick-quoted.
//!
//! ```text
//! RowInsert  →  INSERT INTO `t` (`a`, `b`) VALUES (?, ?)          [new…]
//! RowDelete  →  DELETE FROM `t` WHERE `a` = ? AND `b` IS ?        [old…]
//! RowUpdate  →  UPDATE `t` SET `a` = ? WHERE `a` = ? AND `b` IS ? [new…, old…]
//! ```
//!
//! Old values that are NULL are matched with `IS ?`, since `= NULL` never
//! matches a row.

use replay_core::{ChangeEvent, RowImage, SqlStatement, StatementBuilder, TableRef};

/// Statements that mark a transaction boundary and carry no work when every
/// replayed statement runs in autocommit mode.
const TRANSACTION_KEYWORDS: &[&str] = &["BEGIN", "START TRANSACTION", "COMMIT", "ROLLBACK"];

/// Translate one change event into the statement that replays it.
///
/// Returns `None` for events that need no statement: transaction markers,
/// no-op transaction statements, and row events whose images cannot form a
/// safe statement (a DELETE or UPDATE without any old value would match every
/// row, an UPDATE without new values has nothing to set).
pub fn translate(event: &ChangeEvent) -> Option<SqlStatement> {
    match event {
        ChangeEvent::RowInsert { table, values } => Some(insert(table, values)),
        ChangeEvent::RowDelete { table, values } => delete(table, values),
        ChangeEvent::RowUpdate {
            table,
            before,
            after,
        } => update(table, before, after),
        ChangeEvent::SchemaStatement { statement, .. } => schema_statement(statement),
        ChangeEvent::TransactionMarker => None,
    }
}

fn insert(table: &TableRef, values: &RowImage) -> SqlStatement {
    let mut builder = StatementBuilder::new();
    builder.sql("INSERT INTO ");
    push_table(&mut builder, table);

    builder.sql(" (");
    for (i, column) in values.columns().enumerate() {
        if i > 0 {
            builder.sql(", ");
        }
        builder.identifier(column);
    }

    builder.sql(") VALUES (");
    for (i, value) in values.values().enumerate() {
        if i > 0 {
            builder.sql(", ");
        }
        builder.param(value.clone());
    }
    builder.sql(")");

    builder.build()
}

fn delete(table: &TableRef, before: &RowImage) -> Option<SqlStatement> {
    if before.is_empty() {
        return None;
    }

    let mut builder = StatementBuilder::new();
    builder.sql("DELETE FROM ");
    push_table(&mut builder, table);
    push_where(&mut builder, before);

    Some(builder.build())
}

fn update(table: &TableRef, before: &RowImage, after: &RowImage) -> Option<SqlStatement> {
    if before.is_empty() || after.is_empty() {
        return None;
    }

    let mut builder = StatementBuilder::new();
    builder.sql("UPDATE ");
    push_table(&mut builder, table);

    builder.sql(" SET ");
    for (i, (column, value)) in after.iter().enumerate() {
        if i > 0 {
            builder.sql(", ");
        }
        builder.identifier(column).sql(" = ").param(value.clone());
    }
    push_where(&mut builder, before);

    Some(builder.build())
}

fn schema_statement(statement: &str) -> Option<SqlStatement> {
    let body = statement.trim().trim_end_matches(';').trim_end();
    if body.is_empty() || is_transaction_keyword(body) {
        return None;
    }
    Some(SqlStatement::raw(statement.trim()))
}

fn is_transaction_keyword(body: &str) -> bool {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    TRANSACTION_KEYWORDS
        .iter()
        .any(|kw| normalized.eq_ignore_ascii_case(kw))
}

fn push_table(builder: &mut StatementBuilder, table: &TableRef) {
    if let Some(database) = &table.database {
        builder.identifier(database).sql(".");
    }
    builder.identifier(&table.name);
}

/// ` WHERE a = ? AND b IS ?`, one clause per old-value column, in order.
fn push_where(builder: &mut StatementBuilder, before: &RowImage) {
    builder.sql(" WHERE ");
    for (i, (column, value)) in before.iter().enumerate() {
        if i > 0 {
            builder.sql(" AND ");
        }
        let op = if value.is_null() { " IS " } else { " = " };
        builder.identifier(column).sql(op).param(value.clone());
    }
}
