//! # Rust Job Queue
//!
//! A bounded, blocking job queue feeding a fixed pool of worker threads, and
//! two file tools built on it.
//!
//! ## Features
//!
//! - **Bounded Queue**: fixed-capacity FIFO with blocking push and pop, and an
//!   explicit close / drain / destroy shutdown
//! - **Worker Pool**: N threads running one shared [`Processor`] per job, with
//!   per-worker statistics and panic isolation
//! - **File Walker**: recursive traversal that feeds every regular file into
//!   the queue
//! - **Tools**: substring line search (`fauxgrep`) and a shared byte-class
//!   histogram (`fhistogram`)
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_job_queue::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let queue = Arc::new(BoundedQueue::new(4)?);
//! let total = Arc::new(AtomicU64::new(0));
//!
//! let counter = Arc::clone(&total);
//! let processor = ClosureProcessor::new(move |n: u64| {
//!     counter.fetch_add(n, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! let pool = WorkerPool::start(&PoolConfig::new(2), Arc::clone(&queue), Arc::new(processor))?;
//! for n in 1..=10 {
//!     queue.push(n).map_err(|e| PoolError::other(e.to_string()))?;
//! }
//! queue.close();
//!
//! let stats = pool.join_all()?;
//! assert_eq!(stats.jobs_processed(), 10);
//! assert_eq!(total.load(Ordering::SeqCst), 55);
//!
//! if let Ok(queue) = Arc::try_unwrap(queue) {
//!     queue.destroy()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a Tool Over a Directory
//!
//! ```rust,no_run
//! use rust_job_queue::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let sink = Arc::new(OutputSink::stdout());
//! let search = SearchProcessor::new("TODO", sink);
//!
//! let summary = pipeline::run(
//!     &PoolConfig::new(4),
//!     &FileWalker::new(["src"]),
//!     Arc::new(search),
//! )?;
//! println!("searched {} files", summary.files_queued);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod histogram;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod search;
pub mod tracing;
pub mod walk;

pub use crate::core::{ClosureProcessor, PoolError, Processor, Result};
pub use crate::pool::{PoolConfig, PoolStats, WorkerPool, WorkerStats};
pub use crate::queue::{BoundedQueue, Popped, PushError, TryPop};
