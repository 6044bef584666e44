//! Error types for the store client.

use replay_core::RaggedRowError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The session is absent or broken and could not be (re)established.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// The store rejected a statement.
    #[error("ERROR {code} ({state}): {message}")]
    Execution {
        /// Store error number, e.g. 1062 for a duplicate key
        code: u16,
        /// SQLSTATE
        state: String,
        message: String,
    },

    /// `query_with_retry` ran out of time while errors stayed retryable.
    #[error("gave up after {attempts} attempt(s) in {elapsed:?}: {last}")]
    RetryExhausted {
        attempts: u32,
        elapsed: Duration,
        last: Box<StoreError>,
    },

    /// Placeholders and parameters could not be matched up.
    #[error("cannot bind statement: {0}")]
    Bind(String),

    /// A parameter has no literal form in the store's dialect.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A read was requested but the statement only reported affected rows.
    #[error("statement did not return a result set")]
    NotAResultSet,

    /// A single-row read returned several rows.
    #[error("expected at most one row, got {0}")]
    MultipleRows(usize),

    /// The driver returned rows that do not match the column list.
    #[error("malformed result set: {0}")]
    MalformedResult(#[from] RaggedRowError),
}

impl StoreError {
    /// Build an execution error, mainly for driver adapters and tests.
    pub fn execution(code: u16, message: impl Into<String>) -> Self {
        Self::Execution {
            code,
            state: "HY000".to_string(),
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// The store error number, looking through retry exhaustion.
    pub fn code(&self) -> Option<u16> {
        match self.last_error() {
            Self::Execution { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// The underlying error: for `RetryExhausted` the last error observed,
    /// otherwise `self`.
    pub fn last_error(&self) -> &StoreError {
        match self {
            Self::RetryExhausted { last, .. } => last.last_error(),
            other => other,
        }
    }
}

impl From<mysql_async::Error> for StoreError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(server) => Self::Execution {
                code: server.code,
                state: server.state,
                message: server.message,
            },
            other => Self::Connection {
                message: other.to_string(),
            },
        }
    }
}
