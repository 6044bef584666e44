//! `verify`: catch up on the change log, then compare both stores.

use crate::commands::replicate::catch_up;
use crate::config::StoreArgs;
use anyhow::Context;
use clap::Args;
use consistency_verifier::{verify, VerificationReport};
use replay_core::CompareMode;
use replay_driver::setup_shutdown_handler;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Clone, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Apply this change log to the target before comparing
    #[arg(long, value_name = "PATH", env = "REPLAY_CHANGE_LOG")]
    pub change_log: Option<PathBuf>,

    /// Require rows to come back in the same order on both stores
    #[arg(long)]
    pub ordered: bool,
}

impl VerifyArgs {
    pub fn mode(&self) -> CompareMode {
        if self.ordered {
            CompareMode::Ordered
        } else {
            CompareMode::Unordered
        }
    }
}

/// Returns the report; the caller decides what a mismatch means for the exit
/// status.
pub async fn run_verify(args: VerifyArgs) -> anyhow::Result<VerificationReport> {
    let database = args.store.database()?;
    let mut source = args.store.source_client(Some(database))?;
    let mut target = args.store.target_client(Some(database))?;

    if let Some(change_log) = &args.change_log {
        let stats = catch_up(change_log, &mut target, setup_shutdown_handler()).await?;
        info!("Caught up before verification: {stats}");
    }

    let report = verify(&mut source, &mut target, args.mode())
        .await
        .with_context(|| format!("Failed to verify database {database}"))?;

    for (name, client) in [("source", &mut source), ("target", &mut target)] {
        if let Err(err) = client.close().await {
            warn!("Failed to close the {name} session: {err}");
        }
    }
    Ok(report)
}
