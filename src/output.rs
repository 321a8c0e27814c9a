//! Serialized console output shared by all workers.
//!
//! Every record goes through one lock and is written and flushed in a single
//! call, so lines from different workers never interleave mid-record.

use crate::core::{PoolError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// The process-wide output lock around a writer.
pub struct OutputSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl OutputSink {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Sink writing to any writer
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Sink writing into a fresh in-memory buffer. The returned handle reads
    /// what was written.
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    /// Writes one complete record atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Write`] if the underlying writer fails.
    pub fn emit(&self, record: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer
            .write_all(record)
            .and_then(|()| writer.flush())
            .map_err(PoolError::Write)
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

/// Cloneable in-memory writer, handy for tests and for embedding the tools.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Everything written so far, decoded lossily as UTF-8
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Captured output split into lines
    pub fn lines(&self) -> Vec<String> {
        self.to_string_lossy().lines().map(str::to_owned).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
