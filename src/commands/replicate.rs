//! `replicate`: seed the target, then replay the change log into it.

use crate::bootstrap::Bootstrap;
use crate::config::{parse_duration, StoreArgs};
use anyhow::Context;
use clap::Args;
use replay_core::SqlStatement;
use replay_driver::{
    setup_shutdown_handler, JsonlChangeStream, ReplayDriver, ReplayStats, StatementSink,
    StreamOpts,
};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Args, Clone, Debug)]
pub struct ReplicateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON-lines change log to replay
    #[arg(long, value_name = "PATH", env = "REPLAY_CHANGE_LOG")]
    pub change_log: PathBuf,

    /// Stop at the end of the change log instead of waiting for new events
    #[arg(long)]
    pub no_blocking: bool,

    /// How often to look for new events while waiting (e.g. "500ms", "2s")
    #[arg(long, default_value = "500ms")]
    pub poll_interval: String,

    /// Assume the target already holds a copy of the source database
    #[arg(long)]
    pub skip_bootstrap: bool,

    /// Do not rotate the source's binary log before starting
    #[arg(long)]
    pub skip_flush: bool,
}

impl ReplicateArgs {
    pub fn stream_opts(&self) -> anyhow::Result<StreamOpts> {
        Ok(StreamOpts {
            blocking: !self.no_blocking,
            poll_interval: parse_duration(&self.poll_interval)?,
        })
    }
}

/// Run a full replication: flush, bootstrap, then replay until the change
/// log ends (non-blocking) or Ctrl+C is pressed.
pub async fn run_replicate(
    args: ReplicateArgs,
    bootstrap: &dyn Bootstrap,
) -> anyhow::Result<ReplayStats> {
    let database = args.store.database()?.to_string();
    let opts = args.stream_opts()?;

    if !args.skip_flush {
        let mut source = args.store.source_client(None)?;
        source
            .execute(&SqlStatement::raw("FLUSH BINARY LOGS"))
            .await
            .context("Failed to flush binary logs on the source")?;
        source.close().await?;
        info!("Flushed binary logs on the source");
    }

    if !args.skip_bootstrap {
        bootstrap
            .bootstrap(&database)
            .await
            .with_context(|| format!("Failed to bootstrap database {database}"))?;
    }

    let mut target = args.store.target_client(None)?;
    target
        .ensure_database(&database)
        .await
        .with_context(|| format!("Failed to prepare database {database} on the target"))?;

    let stats = replay(&args.change_log, opts, &mut target, setup_shutdown_handler()).await;
    if let Err(err) = target.close().await {
        warn!("Failed to close the target session: {err}");
    }
    stats
}

/// Apply everything currently in the change log and stop at its end.
pub async fn catch_up<K: StatementSink>(
    change_log: &Path,
    sink: &mut K,
    shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<ReplayStats> {
    let opts = StreamOpts {
        blocking: false,
        ..Default::default()
    };
    replay(change_log, opts, sink, shutdown).await
}

async fn replay<K: StatementSink>(
    change_log: &Path,
    opts: StreamOpts,
    sink: &mut K,
    shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<ReplayStats> {
    info!(
        "Replaying {} ({})",
        change_log.display(),
        if opts.blocking { "following" } else { "until end" }
    );
    let stream = JsonlChangeStream::open(change_log, opts)
        .await
        .with_context(|| format!("Failed to open change log {}", change_log.display()))?;

    let mut driver = ReplayDriver::new(stream, sink);
    let stats = driver.run(shutdown).await?;
    Ok(stats)
}
