//! binlog-replay library
//!
//! Replays a MySQL change log into a MySQL-protocol target (such as
//! MemSQL/SingleStore) and checks that the two stores end up with the same
//! table contents.
//!
//! # Crates
//!
//! - `replay_core` - values, change events, statements and result sets
//! - `event_translator` - change event to parameterized statement
//! - `store_client` - escaping, session management and retries over `mysql_async`
//! - `replay_driver` - change log reader and the replay loop
//! - `consistency_verifier` - table-by-table comparison of two stores
//!
//! # CLI Usage
//!
//! ```bash
//! # Seed the target and follow the change log until Ctrl+C
//! binlog-replay replicate --database shop --change-log changes.jsonl
//!
//! # Apply what is in the log, then compare every table
//! binlog-replay verify --database shop --change-log changes.jsonl
//!
//! # Print the statements a change log would produce
//! binlog-replay dump --change-log changes.jsonl
//! ```

pub mod bootstrap;
pub mod commands;
pub mod config;

pub use bootstrap::{Bootstrap, DumpBootstrap};
pub use config::{parse_duration, parse_time_zone, ConfigError, StoreArgs};
