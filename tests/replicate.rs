//! Catch-up replay as used by `verify` before comparing.

use async_trait::async_trait;
use binlog_replay::bootstrap::Bootstrap;
use binlog_replay::commands::{catch_up, run_replicate, ReplicateArgs};
use clap::Parser;
use replay_core::SqlStatement;
use replay_driver::StatementSink;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use store_client::StoreError;
use tokio::sync::broadcast;

#[derive(Default)]
struct RecordingSink {
    applied: Vec<String>,
}

#[async_trait]
impl StatementSink for RecordingSink {
    async fn apply(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        if statement.sql().starts_with("DROP") {
            return Err(StoreError::execution(1051, "Unknown table"));
        }
        self.applied.push(statement.sql().to_string());
        Ok(1)
    }
}

#[tokio::test]
async fn test_catch_up_stops_at_end_of_log() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"kind":"row_insert","table":{{"name":"t"}},"values":[["id",{{"int":1}}]]}}"#
    )
    .unwrap();
    writeln!(file, r#"{{"kind":"schema_statement","statement":"DROP TABLE gone"}}"#).unwrap();
    writeln!(file, r#"{{"kind":"transaction_marker"}}"#).unwrap();
    writeln!(
        file,
        r#"{{"kind":"row_delete","table":{{"name":"t"}},"values":[["id",{{"int":1}}]]}}"#
    )
    .unwrap();
    file.flush().unwrap();

    let (_tx, rx) = broadcast::channel(1);
    let mut sink = RecordingSink::default();
    let stats = catch_up(file.path(), &mut sink, rx).await.unwrap();

    assert_eq!(
        sink.applied,
        vec![
            "INSERT INTO `t` (`id`) VALUES (?)",
            "DELETE FROM `t` WHERE `id` = ?"
        ]
    );
    assert_eq!(stats.events_received, 4);
    assert_eq!(stats.statements_applied, 2);
    assert_eq!(stats.statements_failed, 1);
    assert_eq!(stats.events_skipped, 1);
}

#[tokio::test]
async fn test_catch_up_reports_missing_log() {
    let dir = tempfile::tempdir().unwrap();
    let (_tx, rx) = broadcast::channel(1);
    let mut sink = RecordingSink::default();
    let err = catch_up(&dir.path().join("missing.jsonl"), &mut sink, rx)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to open change log"));
}

struct CountingBootstrap(AtomicUsize);

#[async_trait]
impl Bootstrap for CountingBootstrap {
    async fn bootstrap(&self, _database: &str) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Parser)]
struct Wrapper {
    #[command(flatten)]
    args: ReplicateArgs,
}

#[tokio::test]
async fn test_replicate_rejects_bad_settings_before_touching_stores() {
    let bootstrap = CountingBootstrap(AtomicUsize::new(0));

    let missing_db = Wrapper::parse_from(["test", "--change-log", "x.jsonl"]).args;
    let err = run_replicate(missing_db, &bootstrap).await.unwrap_err();
    assert_eq!(err.to_string(), "--database is required");

    let bad_interval = Wrapper::parse_from([
        "test",
        "--database",
        "shop",
        "--change-log",
        "x.jsonl",
        "--poll-interval",
        "often",
    ])
    .args;
    assert!(run_replicate(bad_interval, &bootstrap).await.is_err());

    assert_eq!(bootstrap.0.load(Ordering::SeqCst), 0);
}
