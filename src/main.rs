//! Command-line interface for binlog-replay
//!
//! # Usage Examples
//!
//! ```bash
//! # Flush the source's binary log, copy the database, then replay
//! binlog-replay replicate \
//!   --host 127.0.0.1 --source-port 3307 --target-port 3306 \
//!   --database shop --change-log /var/lib/replay/shop.jsonl
//!
//! # Replay to the end of the log and stop
//! binlog-replay replicate --database shop --change-log shop.jsonl \
//!   --no-blocking --skip-bootstrap --skip-flush
//!
//! # Catch up, then compare; exits with status 1 if any table differs
//! binlog-replay verify --database shop --change-log shop.jsonl
//!
//! # Print bound statements without touching either store
//! binlog-replay dump --change-log shop.jsonl --time-zone Asia/Tokyo
//! ```
//!
//! Every option can also be set through its `REPLAY_*` environment variable.

use binlog_replay::commands::{
    run_dump, run_replicate, run_verify, DumpArgs, ReplicateArgs, VerifyArgs,
};
use binlog_replay::DumpBootstrap;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "binlog-replay")]
#[command(about = "Replay a MySQL change log into a MySQL-protocol store and verify the result")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the target and replay the change log into it
    Replicate(ReplicateArgs),

    /// Replay outstanding changes, then compare source and target table by table
    Verify(VerifyArgs),

    /// Print the statements a change log translates to
    Dump(DumpArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replicate(args) => {
            let bootstrap = DumpBootstrap::new(args.store.source_opts(), args.store.target_opts());
            let stats = run_replicate(args, &bootstrap).await?;
            tracing::info!("Replication stopped: {stats}");
        }
        Commands::Verify(args) => {
            let report = run_verify(args).await?;
            println!("{report}");
            if !report.is_consistent() {
                anyhow::bail!("{}", report.summary());
            }
        }
        Commands::Dump(args) => {
            let written = run_dump(args).await?;
            tracing::info!("Wrote {written} statement(s)");
        }
    }

    Ok(())
}
