//! `dump`: print the statements a change log translates to, without
//! executing them.

use crate::config::{parse_time_zone, quoting};
use anyhow::Context;
use chrono_tz::Tz;
use clap::Args;
use event_translator::translate;
use replay_driver::{ChangeStream, JsonlChangeStream, StreamOpts};
use std::io::Write;
use std::path::PathBuf;
use store_client::{bind, Quoting};
use tracing::warn;

#[derive(Args, Clone, Debug)]
pub struct DumpArgs {
    /// JSON-lines change log to translate
    #[arg(long, value_name = "PATH", env = "REPLAY_CHANGE_LOG")]
    pub change_log: PathBuf,

    /// Time zone timestamp values are rendered in
    #[arg(long, default_value = "UTC", env = "REPLAY_TIME_ZONE")]
    pub time_zone: String,

    /// Quote strings as `'it''s'`, for stores in NO_BACKSLASH_ESCAPES mode
    #[arg(long, env = "REPLAY_NO_BACKSLASH_ESCAPES")]
    pub no_backslash_escapes: bool,
}

pub async fn run_dump(args: DumpArgs) -> anyhow::Result<usize> {
    let tz = parse_time_zone(&args.time_zone)?;
    let opts = StreamOpts {
        blocking: false,
        ..Default::default()
    };
    let mut stream = JsonlChangeStream::open(&args.change_log, opts)
        .await
        .with_context(|| format!("Failed to open change log {}", args.change_log.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = dump(&mut stream, &tz, quoting(args.no_backslash_escapes), &mut out).await;
    stream.close().await?;
    written
}

/// Write one `;`-terminated statement per translatable event to `out`,
/// parameters bound as literals. Returns the number of statements written.
pub async fn dump<S, W>(
    stream: &mut S,
    tz: &Tz,
    quoting: Quoting,
    out: &mut W,
) -> anyhow::Result<usize>
where
    S: ChangeStream + ?Sized,
    W: Write,
{
    let mut written = 0;
    while let Some(next) = stream.next().await {
        let event = match next {
            Ok(event) => event,
            Err(err) if err.is_recoverable() => {
                warn!("Skipping malformed event: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let Some(statement) = translate(&event) else {
            continue;
        };
        let sql = bind(&statement, tz, quoting)
            .with_context(|| format!("Failed to bind statement: {statement}"))?;
        writeln!(out, "{sql};")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
