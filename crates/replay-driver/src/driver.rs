//! The replay loop.

use crate::sink::StatementSink;
use crate::stream::{ChangeStream, StreamError};
use event_translator::translate;
use replay_core::ChangeEvent;
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("replay stopped: {0}")]
    Stream(#[from] StreamError),
}

/// Lifecycle of a [`ReplayDriver`].
///
/// ```text
/// Streaming ──(end of stream | shutdown | fatal stream error)──▶ Draining ──▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Pulling events and applying statements.
    Streaming,
    /// No more events are pulled; the stream is being closed.
    Draining,
    /// The stream is closed. Terminal.
    Closed,
}

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Events decoded from the stream.
    pub events_received: u64,
    /// Statements the target accepted.
    pub statements_applied: u64,
    /// Statements the target rejected.
    pub statements_failed: u64,
    /// Events that produced no statement, plus undecodable events.
    pub events_skipped: u64,
}

impl fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events received, {} statements applied, {} failed, {} skipped",
            self.events_received, self.statements_applied, self.statements_failed, self.events_skipped
        )
    }
}

/// Pulls events from a [`ChangeStream`], translates them and applies the
/// resulting statements to a [`StatementSink`], one at a time and in order.
///
/// A statement the target rejects is logged and counted; replay continues
/// with the next event. The stream is closed on every exit path.
pub struct ReplayDriver<S, K> {
    stream: S,
    sink: K,
    state: DriverState,
    stats: ReplayStats,
}

impl<S: ChangeStream, K: StatementSink> ReplayDriver<S, K> {
    pub fn new(stream: S, sink: K) -> Self {
        Self {
            stream,
            sink,
            state: DriverState::Streaming,
            stats: ReplayStats::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Replay until the stream ends, `shutdown` fires, or the stream fails.
    ///
    /// Returns the run's statistics. Only a stream I/O failure is an error;
    /// the stream has been closed by the time it is returned.
    pub async fn run(
        &mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ReplayStats, DriverError> {
        if self.state == DriverState::Closed {
            return Ok(self.stats);
        }
        info!("Starting replay");

        let mut listening = true;
        let outcome = loop {
            if listening {
                match shutdown.try_recv() {
                    Ok(()) | Err(TryRecvError::Lagged(_)) => {
                        info!("Received shutdown signal");
                        break Ok(());
                    }
                    Err(TryRecvError::Closed) => listening = false,
                    Err(TryRecvError::Empty) => {}
                }
            }

            let next = tokio::select! {
                biased;
                signal = shutdown.recv(), if listening => {
                    match signal {
                        Ok(()) | Err(RecvError::Lagged(_)) => {
                            info!("Received shutdown signal");
                            break Ok(());
                        }
                        Err(RecvError::Closed) => {
                            listening = false;
                            continue;
                        }
                    }
                }
                next = self.stream.next() => next,
            };

            match next {
                None => {
                    info!("Change stream has no more events");
                    break Ok(());
                }
                Some(Ok(event)) => self.apply(&event).await,
                Some(Err(err)) if err.is_recoverable() => {
                    warn!("Skipping malformed event: {err}");
                    self.stats.events_skipped += 1;
                }
                Some(Err(err)) => {
                    error!("Change stream failed: {err}");
                    break Err(err);
                }
            }
        };

        self.state = DriverState::Draining;
        if let Err(err) = self.stream.close().await {
            warn!("Error while closing change stream: {err}");
        }
        self.state = DriverState::Closed;

        info!("Replay finished: {}", self.stats);
        outcome.map(|()| self.stats).map_err(DriverError::from)
    }

    async fn apply(&mut self, event: &ChangeEvent) {
        self.stats.events_received += 1;

        match translate(event) {
            None => {
                debug!("No statement for {} event", event.kind());
                self.stats.events_skipped += 1;
            }
            Some(statement) => match self.sink.apply(&statement).await {
                Ok(affected) => {
                    self.stats.statements_applied += 1;
                    debug!("Applied {} ({affected} row(s)): {statement}", event.kind());
                }
                Err(err) => {
                    self.stats.statements_failed += 1;
                    let table = event
                        .table()
                        .map_or_else(|| "-".to_string(), ToString::to_string);
                    let code = err
                        .code()
                        .map_or_else(|| "-".to_string(), |c| c.to_string());
                    error!(
                        "Failed to apply {} on table {table} (code {code}): {err}; statement: {statement}",
                        event.kind()
                    );
                }
            },
        }

        if self.stats.events_received % 100 == 0 {
            info!("Processed {} events", self.stats.events_received);
        }
    }
}

/// Send on the returned channel's sender when Ctrl+C is pressed.
pub fn setup_shutdown_handler() -> broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return;
        }
        info!("Received interrupt signal (Ctrl+C)");
        let _ = shutdown_tx.send(());
    });

    shutdown_rx
}
