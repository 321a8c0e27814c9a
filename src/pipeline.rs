//! Producer/consumer wiring for the file tools.
//!
//! One call to [`run`] owns the whole lifecycle: create the queue, start the
//! workers, walk the roots on the calling thread, close the queue, join the
//! workers and destroy the queue.

use crate::core::{PoolError, Processor, Result};
use crate::pool::{PoolConfig, PoolStats, WorkerPool};
use crate::queue::BoundedQueue;
use crate::walk::FileWalker;
use std::path::PathBuf;
use std::sync::Arc;

/// What a completed run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files pushed into the queue
    pub files_queued: u64,
    /// Entries the walker could not read
    pub entries_skipped: u64,
    /// Per-worker counters
    pub pool: PoolStats,
}

/// Run `processor` over every regular file under the walker's roots.
///
/// Per-file failures are logged by the workers and counted in
/// [`RunSummary::pool`]; they never fail the run.
///
/// # Errors
///
/// - [`PoolError::InvalidConfig`] / [`PoolError::InvalidCapacity`] for a bad
///   configuration
/// - [`PoolError::Allocation`] if the queue storage cannot be reserved
/// - [`PoolError::Spawn`] or [`PoolError::Join`] if a worker thread fails
/// - [`PoolError::Write`] if output could not be written; the first failure
///   stops the workers and the traversal
pub fn run(
    config: &PoolConfig,
    walker: &FileWalker,
    processor: Arc<dyn Processor<PathBuf>>,
) -> Result<RunSummary> {
    config.validate()?;
    let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
    let pool = WorkerPool::start(config, Arc::clone(&queue), processor)?;

    let produced = walker.produce(&queue);
    let stats = pool.join_all()?;

    let queue =
        Arc::try_unwrap(queue).map_err(|q| PoolError::still_shared(Arc::strong_count(&q)))?;
    queue.destroy()?;

    log::info!(
        "{} files queued, {} processed, {} failed, {} skipped",
        produced.files_queued,
        stats.jobs_processed(),
        stats.jobs_failed() + stats.jobs_panicked(),
        produced.entries_skipped
    );

    Ok(RunSummary {
        files_queued: produced.files_queued,
        entries_skipped: produced.entries_skipped,
        pool: stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureProcessor;
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_every_file_processed_once() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            fs::write(dir.path().join(format!("f{:02}", i)), "x").unwrap();
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let processor = ClosureProcessor::new(move |path: PathBuf| {
            sink.lock().push(path);
            Ok(())
        });

        let config = PoolConfig::new(3).with_queue_capacity(2);
        let summary = run(&config, &FileWalker::new([dir.path()]), Arc::new(processor)).unwrap();

        assert_eq!(summary.files_queued, 20);
        assert_eq!(summary.pool.jobs_processed(), 20);
        assert_eq!(summary.pool.workers.len(), 3);

        let mut seen = seen.lock().clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_failures_do_not_fail_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), "a").unwrap();
        fs::write(dir.path().join("b"), "b").unwrap();

        let processor = ClosureProcessor::new(|path: PathBuf| {
            if path.ends_with("a") {
                Err(PoolError::other("bad file"))
            } else {
                Ok(())
            }
        });

        let summary = run(
            &PoolConfig::new(2),
            &FileWalker::new([dir.path()]),
            Arc::new(processor),
        )
        .unwrap();
        assert_eq!(summary.pool.jobs_processed(), 1);
        assert_eq!(summary.pool.jobs_failed(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let processor = ClosureProcessor::new(|_: PathBuf| Ok(()));
        let config = PoolConfig::new(1).with_queue_capacity(0);
        let result = run(&config, &FileWalker::new(["."]), Arc::new(processor));
        assert!(matches!(result, Err(PoolError::InvalidConfig { .. })));
    }

    #[test]
    fn test_no_roots_is_empty_run() {
        let processor = ClosureProcessor::new(|_: PathBuf| Ok(()));
        let walker = FileWalker::new(Vec::<PathBuf>::new());
        let summary = run(&PoolConfig::new(2), &walker, Arc::new(processor)).unwrap();
        assert_eq!(summary.files_queued, 0);
        assert_eq!(summary.pool.jobs_handled(), 0);
    }

    #[test]
    fn test_write_failure_stops_run() {
        let dir = tempdir().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{:02}", i)), "x").unwrap();
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let processor = ClosureProcessor::new(move |_: PathBuf| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PoolError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdout closed",
            )))
        });

        let config = PoolConfig::new(1).with_queue_capacity(1);
        let result = run(&config, &FileWalker::new([dir.path()]), Arc::new(processor));

        assert!(matches!(result, Err(ref e) if e.is_broken_pipe()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
