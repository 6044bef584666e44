//! JSON-lines change log reading.

use replay_core::{ChangeEvent, SqlValue};
use replay_driver::{ChangeStream, JsonlChangeStream, StreamError, StreamOpts};
use std::io::Write;
use std::time::Duration;

const INSERT_1: &str =
    r#"{"kind":"row_insert","table":{"name":"t"},"values":[["id",{"int":1}],["name",{"text":"a"}]]}"#;
const INSERT_2: &str = r#"{"kind":"row_insert","table":{"name":"t"},"values":[["id",{"int":2}]]}"#;

fn non_blocking() -> StreamOpts {
    StreamOpts {
        blocking: false,
        poll_interval: Duration::from_millis(10),
    }
}

fn inserted_id(event: &ChangeEvent) -> Option<i64> {
    match event {
        ChangeEvent::RowInsert { values, .. } => values.get("id").and_then(SqlValue::as_i64),
        _ => None,
    }
}

#[tokio::test]
async fn test_reads_to_end_of_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{INSERT_1}\n\n{{\"kind\":\"row_insert\"\n{{\"kind\":\"transaction_marker\"}}\n{INSERT_2}"
    )
    .unwrap();
    file.flush().unwrap();

    let mut stream = JsonlChangeStream::open(file.path(), non_blocking()).await.unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(inserted_id(&first), Some(1));

    match stream.next().await.unwrap() {
        Err(StreamError::Decode { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a decode error, got {other:?}"),
    }

    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        ChangeEvent::TransactionMarker
    );

    // The last line has no trailing newline but is still delivered.
    let last = stream.next().await.unwrap().unwrap();
    assert_eq!(inserted_id(&last), Some(2));

    assert!(stream.next().await.is_none());
    assert_eq!(stream.lines_read(), 5);
}

#[tokio::test]
async fn test_closed_stream_yields_nothing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{INSERT_1}").unwrap();
    file.flush().unwrap();

    let mut stream = JsonlChangeStream::open(file.path(), non_blocking()).await.unwrap();
    stream.close().await.unwrap();
    stream.close().await.unwrap();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = JsonlChangeStream::open(dir.path().join("nope.jsonl"), non_blocking()).await;
    assert!(matches!(result, Err(StreamError::Io(_))));
}

#[tokio::test]
async fn test_blocking_stream_tails_appended_lines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{INSERT_1}").unwrap();
    file.flush().unwrap();

    let opts = StreamOpts {
        blocking: true,
        poll_interval: Duration::from_millis(10),
    };
    let mut stream = JsonlChangeStream::open(file.path(), opts).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(inserted_id(&first), Some(1));

    let mut writer = file.reopen().unwrap();
    let writer_task = tokio::spawn(async move {
        use std::io::{Seek, SeekFrom};
        writer.seek(SeekFrom::End(0)).unwrap();
        let (head, tail) = INSERT_2.split_at(20);

        tokio::time::sleep(Duration::from_millis(50)).await;
        write!(writer, "{head}").unwrap();
        writer.flush().unwrap();

        // The reader must hold the partial line until the newline arrives.
        tokio::time::sleep(Duration::from_millis(50)).await;
        writeln!(writer, "{tail}").unwrap();
        writer.flush().unwrap();
    });

    let second = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("tailing stream should see the appended line")
        .unwrap()
        .unwrap();
    assert_eq!(inserted_id(&second), Some(2));
    writer_task.await.unwrap();

    // Nothing more is written, so the stream keeps waiting.
    let idle = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
    assert!(idle.is_err());
}
