//! Convenient re-exports for common types and traits

pub use crate::core::{ClosureProcessor, PoolError, Processor, Result};
pub use crate::histogram::{Histogram, HistogramProcessor, SharedHistogram};
pub use crate::output::OutputSink;
pub use crate::pipeline::{self, RunSummary};
pub use crate::pool::{PoolConfig, PoolStats, WorkerPool, WorkerStats};
pub use crate::queue::{BoundedQueue, Popped, PushError, TryPop};
pub use crate::search::{LineTerminator, SearchProcessor};
pub use crate::walk::FileWalker;
