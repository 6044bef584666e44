//! Resilient client for MySQL-protocol stores.
//!
//! [`StoreClient`] wraps one session to a store and takes care of:
//!
//! - **Binding**: parameters are rendered as MySQL literals by `mysql_async`
//!   and bound to the `?` placeholders of a
//!   [`SqlStatement`](replay_core::SqlStatement)
//! - **Idle reconnect**: a session unused for longer than the idle timeout
//!   is replaced before the next statement
//! - **Broken sessions**: a connection failure mid-statement drops the
//!   session and is returned; the next statement reconnects
//! - **Bounded retry**: [`StoreClient::query_with_retry`] retries at a fixed
//!   interval within a time window while a caller-supplied predicate allows
//! - **Time zones**: timestamps are bound in an explicit zone that each
//!   session also selects with `SET time_zone`
//!
//! The network side sits behind the [`Connector`] / [`Session`] traits.
//! [`MySqlConnector`] is the `mysql_async` implementation; tests plug in
//! their own.
//!
//! # Example
//!
//! ```rust,no_run
//! use replay_core::{SqlStatement, SqlValue};
//! use store_client::{ClientConfig, MySqlConnector, MySqlOpts, StoreClient};
//!
//! # async fn example() -> Result<(), store_client::StoreError> {
//! let opts = MySqlOpts {
//!     host: "127.0.0.1".into(),
//!     port: 3306,
//!     user: "root".into(),
//!     password: String::new(),
//! };
//! let config = ClientConfig {
//!     database: Some("shop".into()),
//!     ..Default::default()
//! };
//! let mut client = StoreClient::new(MySqlConnector::new(opts, config.time_zone), config);
//!
//! let stmt = SqlStatement::new("SELECT * FROM `orders` WHERE `id` = ?", vec![SqlValue::Int(1)])
//!     .expect("one placeholder, one parameter");
//! let order = client.get(&stmt).await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;
pub mod literal;
mod mysql;
mod session;

pub use client::{ClientConfig, RetryPolicy, StoreClient};
pub use error::StoreError;
pub use literal::{bind, literal, to_mysql_value, Quoting};
pub use mysql::{MySqlConnector, MySqlOpts, MySqlSession};
pub use session::{Connector, QueryOutcome, Session};
