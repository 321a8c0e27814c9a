//! Byte-value histogram with a shared, lock-guarded aggregate

use crate::core::{PoolError, Processor, Result};
use crate::output::OutputSink;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of buckets in a histogram
pub const BUCKETS: usize = 8;

/// Bytes a worker reads between merges into the shared histogram
pub const DEFAULT_FLUSH_EVERY: NonZeroU64 = match NonZeroU64::new(100_000) {
    Some(n) => n,
    None => panic!("flush interval must be non-zero"),
};

const READ_CHUNK: usize = 64 * 1024;

/// Bucket a byte belongs to: its top three bits.
#[inline]
pub fn bucket_of(byte: u8) -> usize {
    (byte >> 5) as usize
}

/// Eight byte-class counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BUCKETS],
}

impl Histogram {
    /// An all-zero histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from raw counts
    pub fn from_counts(counts: [u64; BUCKETS]) -> Self {
        Self { counts }
    }

    /// Count one byte
    #[inline]
    pub fn record(&mut self, byte: u8) {
        self.counts[bucket_of(byte)] += 1;
    }

    /// Count every byte of `bytes`
    pub fn record_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.record(byte);
        }
    }

    /// Elementwise addition of `other` into `self`
    pub fn merge(&mut self, other: &Histogram) {
        for (total, add) in self.counts.iter_mut().zip(other.counts.iter()) {
            *total += add;
        }
    }

    /// The raw counters
    pub fn counts(&self) -> &[u64; BUCKETS] {
        &self.counts
    }

    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Whether every counter is zero
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Reset every counter to zero
    pub fn clear(&mut self) {
        self.counts = [0; BUCKETS];
    }
}

/// Space-separated counters, e.g. `12 0 7 0 0 3 1 0`.
impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, count) in self.counts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", count)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Aggregate {
    totals: Histogram,
    merges: u64,
}

/// Global counters shared by every worker, guarded by their own lock.
#[derive(Debug, Default)]
pub struct SharedHistogram {
    inner: Mutex<Aggregate>,
}

impl SharedHistogram {
    /// A zeroed aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `partial` into the totals, resets `partial`, and returns a copy of
    /// the merged totals taken under the same lock.
    pub fn merge_and_snapshot(&self, partial: &mut Histogram) -> Histogram {
        let snapshot = {
            let mut aggregate = self.inner.lock();
            aggregate.totals.merge(partial);
            aggregate.merges += 1;
            aggregate.totals
        };
        partial.clear();
        snapshot
    }

    /// A consistent copy of the current totals
    pub fn snapshot(&self) -> Histogram {
        self.inner.lock().totals
    }

    /// Number of merges performed so far
    pub fn merge_count(&self) -> u64 {
        self.inner.lock().merges
    }
}

/// Counts byte classes of each file into a [`SharedHistogram`].
///
/// Each job builds a local histogram and merges it into the shared one after
/// every `flush_every` bytes and once more at end of file, printing the merged
/// totals after each merge. An empty file still gets its one end-of-file
/// merge.
pub struct HistogramProcessor {
    shared: Arc<SharedHistogram>,
    sink: Arc<OutputSink>,
    flush_every: NonZeroU64,
}

impl fmt::Debug for HistogramProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramProcessor")
            .field("shared", &self.shared)
            .field("flush_every", &self.flush_every)
            .finish()
    }
}

impl HistogramProcessor {
    /// Create a processor merging into `shared` and printing to `sink`
    pub fn new(shared: Arc<SharedHistogram>, sink: Arc<OutputSink>) -> Self {
        Self {
            shared,
            sink,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }

    /// Set how many bytes are read between merges
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_flush_every(mut self, bytes: NonZeroU64) -> Self {
        self.flush_every = bytes;
        self
    }

    /// Histogram one file.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Open`] if the file cannot be opened
    /// - [`PoolError::Read`] if reading fails part way; counts merged before
    ///   the failure stay merged
    pub fn histogram_file(&self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|e| PoolError::open(path, e))?;
        self.histogram_reader(path, file)
    }

    /// Histogram any reader, using `path` in error messages.
    pub fn histogram_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<()> {
        let mut local = Histogram::new();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut since_flush: u64 = 0;

        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PoolError::read(path, e)),
            };

            for &byte in &buf[..read] {
                local.record(byte);
                since_flush += 1;
                if since_flush == self.flush_every.get() {
                    self.flush(&mut local)?;
                    since_flush = 0;
                }
            }
        }

        self.flush(&mut local)
    }

    fn flush(&self, local: &mut Histogram) -> Result<()> {
        let snapshot = self.shared.merge_and_snapshot(local);
        self.sink.emit(format!("{}\n", snapshot).as_bytes())
    }
}

impl Processor<PathBuf> for HistogramProcessor {
    fn process(&self, path: PathBuf) -> Result<()> {
        self.histogram_file(&path)
    }

    fn name(&self) -> &str {
        "HistogramProcessor"
    }
}
