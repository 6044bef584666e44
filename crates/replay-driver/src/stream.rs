//! The change stream seam.

use async_trait::async_trait;
use replay_core::ChangeEvent;
use thiserror::Error;

/// Errors a change stream can report.
#[derive(Error, Debug)]
pub enum StreamError {
    /// One event could not be decoded. The stream can continue past it.
    #[error("cannot decode event at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The stream itself failed and cannot continue.
    #[error("change stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// `true` if the stream can still produce events after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// An ordered source of change events.
///
/// `next` returns `None` once the stream has nothing more to deliver: at the
/// end of the log in non-blocking mode, or after `close`. A blocking stream
/// waits inside `next` until an event arrives; the wait must be safe to drop
/// so the driver can interrupt it on shutdown.
#[async_trait]
pub trait ChangeStream: Send {
    async fn next(&mut self) -> Option<Result<ChangeEvent, StreamError>>;

    /// Release the underlying reader. Calling it more than once is allowed.
    async fn close(&mut self) -> Result<(), StreamError>;
}

#[async_trait]
impl<S: ChangeStream + ?Sized> ChangeStream for Box<S> {
    async fn next(&mut self) -> Option<Result<ChangeEvent, StreamError>> {
        (**self).next().await
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        (**self).close().await
    }
}
