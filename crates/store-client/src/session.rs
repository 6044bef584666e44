//! The driver seam: one live session to a store.
//!
//! [`StoreClient`](crate::StoreClient) owns at most one [`Session`] at a time
//! and asks its [`Connector`] for a fresh one whenever the current session is
//! missing, idle for too long, or broken.

use crate::error::StoreError;
use async_trait::async_trait;
use replay_core::ResultSet;

/// What a statement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A statement without a result set, with its affected-row count.
    Affected(u64),
    /// A result set, possibly empty.
    Rows(ResultSet),
}

impl QueryOutcome {
    /// Affected rows, or the number of returned rows for a result set.
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Affected(n) => *n,
            Self::Rows(rows) => rows.len() as u64,
        }
    }

    pub fn into_result_set(self) -> Option<ResultSet> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Affected(_) => None,
        }
    }
}

/// A single open session that executes fully bound SQL text.
#[async_trait]
pub trait Session: Send {
    /// Execute one statement.
    ///
    /// Implementations must report a dead or unusable session as
    /// [`StoreError::Connection`] so the client can reconnect.
    async fn execute(&mut self, sql: &str) -> Result<QueryOutcome, StoreError>;

    /// Close the session.
    async fn close(self) -> Result<(), StoreError>;
}

/// Opens sessions to one store.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn connect(&self) -> Result<Self::Session, StoreError>;
}
