//! Core types for binlog-replay.
//!
//! This crate provides the foundational types shared by every other crate in
//! the workspace:
//!
//! - [`SqlValue`] - A single column value as it travels from the change log to
//!   the target store and back out of a result set
//! - [`RowImage`] - An ordered column → value mapping (a before or after image)
//! - [`ChangeEvent`] - One row change or schema statement from the change log
//! - [`SqlStatement`] - A placeholder template plus its ordered parameters
//! - [`ResultSet`] - Column names and rows returned by a read statement
//!
//! # Architecture
//!
//! ```text
//! replay-core (this crate)
//!    │
//!    ├─── event-translator       (ChangeEvent → SqlStatement)
//!    ├─── store-client           (SqlStatement → store, store → ResultSet)
//!    ├─── replay-driver          (change stream → translator → store-client)
//!    └─── consistency-verifier   (ResultSet comparison across two stores)
//! ```
//!
//! # Example
//!
//! ```rust
//! use replay_core::{ChangeEvent, RowImage, SqlValue, TableRef};
//!
//! let event = ChangeEvent::RowInsert {
//!     table: TableRef::new("users"),
//!     values: RowImage::new()
//!         .with("id", SqlValue::Int(1))
//!         .with("name", SqlValue::from("alice")),
//! };
//! assert_eq!(event.table().map(|t| t.name.as_str()), Some("users"));
//! ```

pub mod event;
pub mod result;
pub mod statement;
pub mod value;

pub use event::{ChangeEvent, EventKind, RowImage, TableRef};
pub use result::{CompareMode, RaggedRowError, ResultSet, RowView};
pub use statement::{
    placeholder_positions, quote_identifier, SqlStatement, StatementBuilder, StatementError,
};
pub use value::SqlValue;
