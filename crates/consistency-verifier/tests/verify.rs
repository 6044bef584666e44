//! verify() against in-memory stores.

use async_trait::async_trait;
use consistency_verifier::{verify, TableReader, VerifyError};
use replay_core::{CompareMode, ResultSet, SqlStatement, SqlValue};
use std::collections::BTreeMap;
use store_client::StoreError;

/// Tables keyed by name; a table may be set up to fail with an error code.
#[derive(Default)]
struct MemoryStore {
    tables: BTreeMap<String, Result<ResultSet, u16>>,
    list_fails: bool,
    reads: Vec<String>,
}

impl MemoryStore {
    fn with_table(mut self, name: &str, rows: &[(i64, &str)]) -> Self {
        self.tables.insert(name.to_string(), Ok(people(rows)));
        self
    }

    fn with_failing_table(mut self, name: &str, code: u16) -> Self {
        self.tables.insert(name.to_string(), Err(code));
        self
    }
}

#[async_trait]
impl TableReader for MemoryStore {
    async fn tables(&mut self) -> Result<Vec<String>, StoreError> {
        if self.list_fails {
            return Err(StoreError::connection("server has gone away"));
        }
        Ok(self.tables.keys().cloned().collect())
    }

    async fn read(&mut self, statement: &SqlStatement) -> Result<ResultSet, StoreError> {
        self.reads.push(statement.sql().to_string());
        let name = statement
            .sql()
            .strip_prefix("SELECT * FROM `")
            .and_then(|rest| rest.strip_suffix('`'))
            .unwrap_or_default();
        match self.tables.get(name) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(code)) => Err(StoreError::execution(*code, "read failed")),
            None => Err(StoreError::execution(
                1146,
                format!("Table '{name}' doesn't exist"),
            )),
        }
    }
}

fn people(rows: &[(i64, &str)]) -> ResultSet {
    ResultSet::new(
        vec!["id".into(), "name".into()],
        rows.iter()
            .map(|(id, name)| vec![SqlValue::Int(*id), SqlValue::from(*name)])
            .collect(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_identical_stores_are_consistent() {
    let mut source = MemoryStore::default()
        .with_table("a", &[(1, "x"), (2, "y")])
        .with_table("b", &[]);
    let mut target = MemoryStore::default()
        .with_table("a", &[(1, "x"), (2, "y")])
        .with_table("b", &[]);

    let report = verify(&mut source, &mut target, CompareMode::Ordered)
        .await
        .unwrap();

    assert!(report.is_consistent());
    assert_eq!(report.tables.len(), 2);
    assert_eq!(source.reads, vec!["SELECT * FROM `a`", "SELECT * FROM `b`"]);
}

#[tokio::test]
async fn test_row_order_matters_only_when_ordered() {
    let mut source = MemoryStore::default().with_table("a", &[(1, "x"), (2, "y")]);
    let mut target = MemoryStore::default().with_table("a", &[(2, "y"), (1, "x")]);

    let unordered = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();
    assert!(unordered.is_consistent());

    let ordered = verify(&mut source, &mut target, CompareMode::Ordered)
        .await
        .unwrap();
    assert!(!ordered.is_consistent());
}

#[tokio::test]
async fn test_mismatch_is_recorded_and_verification_continues() {
    let mut source = MemoryStore::default()
        .with_table("a", &[(1, "x")])
        .with_table("b", &[(1, "x")])
        .with_table("c", &[(5, "z")]);
    let mut target = MemoryStore::default()
        .with_table("a", &[(1, "x")])
        .with_table("b", &[(1, "changed")])
        .with_table("c", &[(5, "z")]);

    let report = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();

    let tables: Vec<_> = report.tables.iter().map(|t| (t.table.as_str(), t.equal)).collect();
    assert_eq!(tables, vec![("a", true), ("b", false), ("c", true)]);
    let mismatch = report.mismatched().next().unwrap();
    assert!(mismatch
        .diagnostic
        .as_deref()
        .unwrap()
        .contains("row(s) only on the left"));
}

#[tokio::test]
async fn test_only_target_tables_are_compared() {
    let mut source = MemoryStore::default()
        .with_table("a", &[(1, "x")])
        .with_table("extra", &[(1, "x")]);
    let mut target = MemoryStore::default().with_table("a", &[(1, "x")]);

    let report = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();

    assert!(report.is_consistent());
    assert_eq!(source.reads, vec!["SELECT * FROM `a`"]);
}

#[tokio::test]
async fn test_table_missing_from_source_is_a_mismatch() {
    let mut source = MemoryStore::default();
    let mut target = MemoryStore::default().with_table("a", &[(1, "x")]);

    let report = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();

    let result = &report.tables[0];
    assert!(!result.equal);
    assert!(result.diagnostic.as_deref().unwrap().starts_with("source failed: ERROR 1146"));
}

#[tokio::test]
async fn test_same_error_on_both_sides_counts_as_equal() {
    let mut source = MemoryStore::default()
        .with_failing_table("a", 1105)
        .with_failing_table("b", 1105);
    let mut target = MemoryStore::default()
        .with_failing_table("a", 1105)
        .with_failing_table("b", 1146);

    let report = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();

    assert!(report.tables[0].equal);
    assert_eq!(
        report.tables[0].diagnostic.as_deref(),
        Some("both stores failed with error 1105")
    );
    assert!(!report.tables[1].equal);
}

#[tokio::test]
async fn test_different_columns_are_a_mismatch() {
    let mut source = MemoryStore::default().with_table("a", &[(1, "x")]);
    let mut target = MemoryStore::default();
    target.tables.insert(
        "a".to_string(),
        Ok(ResultSet::new(
            vec!["id".into(), "title".into()],
            vec![vec![SqlValue::Int(1), SqlValue::from("x")]],
        )
        .unwrap()),
    );

    let report = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap();
    assert!(report.tables[0]
        .diagnostic
        .as_deref()
        .unwrap()
        .contains("column names differ"));
}

#[tokio::test]
async fn test_listing_failure_aborts() {
    let mut source = MemoryStore::default();
    let mut target = MemoryStore {
        list_fails: true,
        ..Default::default()
    };

    let err = verify(&mut source, &mut target, CompareMode::Unordered)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::ListTables(ref e) if e.is_connection()));
}
