//! Change log stored as JSON lines, one [`ChangeEvent`] per line.
//!
//! ```text
//! {"kind":"row_insert","table":{"name":"t"},"values":[["id",{"int":1}]]}
//! {"kind":"schema_statement","statement":"ALTER TABLE t ADD c INT"}
//! {"kind":"transaction_marker"}
//! ```
//!
//! In blocking mode the file is tailed: at end of file the stream waits for
//! the writer to append more lines. An incomplete last line is held back
//! until its newline arrives. In non-blocking mode end of file ends the
//! stream.

use crate::stream::{ChangeStream, StreamError};
use async_trait::async_trait;
use replay_core::ChangeEvent;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// How the stream behaves at end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOpts {
    /// Wait for new lines instead of ending at end of file.
    pub blocking: bool,
    /// How often to look for new lines while waiting.
    pub poll_interval: Duration,
}

impl Default for StreamOpts {
    fn default() -> Self {
        Self {
            blocking: true,
            poll_interval: Duration::from_millis(500),
        }
    }
}

pub struct JsonlChangeStream {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    opts: StreamOpts,
    /// Bytes read for the line currently being assembled.
    pending: Vec<u8>,
    line: usize,
}

impl JsonlChangeStream {
    pub async fn open(path: impl AsRef<Path>, opts: StreamOpts) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        debug!("Opened change log {}", path.display());
        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
            opts,
            pending: Vec::new(),
            line: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    /// Read the next complete line, or `None` at end of input.
    ///
    /// Partial reads stay in `pending`, so dropping this future mid-wait
    /// loses nothing.
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };

            let read = reader.read_until(b'\n', &mut self.pending).await?;
            if self.pending.ends_with(b"\n") {
                self.line += 1;
                return Ok(Some(std::mem::take(&mut self.pending)));
            }
            if read > 0 {
                continue;
            }

            // End of file, possibly with a partial line buffered.
            if !self.opts.blocking {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                self.line += 1;
                return Ok(Some(std::mem::take(&mut self.pending)));
            }
            tokio::time::sleep(self.opts.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChangeStream for JsonlChangeStream {
    async fn next(&mut self) -> Option<Result<ChangeEvent, StreamError>> {
        loop {
            let text = match self.next_line().await {
                Ok(Some(text)) => text,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            if text.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Some(
                serde_json::from_slice(&text).map_err(|source| StreamError::Decode {
                    line: self.line,
                    source,
                }),
            );
        }
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        if self.reader.take().is_some() {
            debug!(
                "Closed change log {} after {} lines",
                self.path.display(),
                self.line
            );
        }
        Ok(())
    }
}
