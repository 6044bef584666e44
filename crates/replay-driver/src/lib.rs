//! Change-log replay.
//!
//! [`ReplayDriver`] connects the pieces of a replay run:
//!
//! ```text
//! ChangeStream ──ChangeEvent──▶ event_translator::translate ──SqlStatement──▶ StatementSink
//!   (JSONL log,                      (pure, no I/O)                        (StoreClient on
//!    tailed or read to EOF)                                                 the target store)
//! ```
//!
//! Events are applied strictly in stream order, one statement at a time.
//! A failing statement never stops the run; a failing stream does.
//!
//! # Example
//!
//! ```rust,no_run
//! use replay_driver::{setup_shutdown_handler, JsonlChangeStream, ReplayDriver, StreamOpts};
//! use store_client::{ClientConfig, MySqlConnector, MySqlOpts, StoreClient};
//!
//! # async fn example(opts: MySqlOpts) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let target = StoreClient::new(MySqlConnector::new(opts, config.time_zone), config);
//! let stream = JsonlChangeStream::open("changes.jsonl", StreamOpts::default()).await?;
//!
//! let mut driver = ReplayDriver::new(stream, target);
//! let stats = driver.run(setup_shutdown_handler()).await?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

mod driver;
mod jsonl;
mod sink;
mod stream;

pub use driver::{setup_shutdown_handler, DriverError, DriverState, ReplayDriver, ReplayStats};
pub use jsonl::{JsonlChangeStream, StreamOpts};
pub use sink::StatementSink;
pub use stream::{ChangeStream, StreamError};
