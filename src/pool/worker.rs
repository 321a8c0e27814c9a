//! Worker thread implementation

use crate::core::{PoolError, Processor, Result};
use crate::queue::{BoundedQueue, Popped};
use std::panic::{catch_unwind, AssertUnwindSafe};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs processed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs whose processor returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs whose processor panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Total jobs this worker popped, whatever their outcome
    pub fn get_jobs_handled(&self) -> u64 {
        self.get_jobs_processed() + self.get_jobs_failed() + self.get_jobs_panicked()
    }

    /// Copy the counters into a plain value
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a worker's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    /// Jobs processed successfully
    pub jobs_processed: u64,
    /// Jobs whose processor returned an error
    pub jobs_failed: u64,
    /// Jobs whose processor panicked
    pub jobs_panicked: u64,
    /// Time spent processing jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStatsSnapshot {
    /// Total jobs popped by the worker
    pub fn jobs_handled(&self) -> u64 {
        self.jobs_processed + self.jobs_failed + self.jobs_panicked
    }
}

/// Holds the first fatal error raised by any worker of a pool.
///
/// Once tripped, workers stop taking jobs and the queue is closed, so the
/// producer stops pushing as well. Jobs still queued are dropped unprocessed.
#[derive(Debug, Default)]
pub struct AbortSignal {
    tripped: AtomicBool,
    error: Mutex<Option<PoolError>>,
}

impl AbortSignal {
    /// Create an untripped signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` as the reason for aborting. Only the first call wins;
    /// returns `false` if an error was already recorded.
    pub fn trip(&self, error: PoolError) -> bool {
        let mut slot = self.error.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(error);
        self.tripped.store(true, Ordering::Release);
        true
    }

    /// Whether a fatal error has been recorded
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Take the recorded error, if any
    pub fn take(&self) -> Option<PoolError> {
        self.error.lock().take()
    }
}

/// A worker thread that pops jobs from a shared queue until it is drained
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this worker
    /// * `name_prefix` - Thread name prefix, the id is appended
    /// * `queue` - Queue to pop jobs from
    /// * `processor` - Routine run on every popped job
    /// * `abort` - Shared with the other workers; tripped on a fatal error
    ///
    /// # Shutdown Behavior
    ///
    /// The worker exits when `pop` reports the queue closed and drained, so
    /// every job queued before `close` is processed first. A fatal job error
    /// ([`PoolError::is_fatal`]) trips `abort`, closes the queue and makes
    /// every worker exit without draining.
    pub fn spawn<T: Send + 'static>(
        id: usize,
        name_prefix: &str,
        queue: Arc<BoundedQueue<T>>,
        processor: Arc<dyn Processor<T>>,
        abort: Arc<AbortSignal>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || {
                Self::run(id, &queue, processor.as_ref(), &stats_clone, &abort);
            })
            .map_err(|e| PoolError::spawn_with_source(id, "thread creation failed", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run<T>(
        id: usize,
        queue: &BoundedQueue<T>,
        processor: &dyn Processor<T>,
        stats: &WorkerStats,
        abort: &AbortSignal,
    ) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", id);

        while let Popped::Job(job) = queue.pop() {
            if abort.is_tripped() {
                break;
            }

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_busy(id);

            let fatal = Self::process_job(id, job, processor, stats);

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_idle(id);

            if let Some(e) = fatal {
                log::debug!("worker {}: aborting run: {}", id, e);
                if abort.trip(e) {
                    queue.close();
                }
                break;
            }
        }

        log::debug!(
            "worker {} exiting: {} processed, {} failed, {} panicked",
            id,
            stats.get_jobs_processed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked()
        );
    }

    /// Run the processor on one job with panic protection. The job is
    /// consumed by the processor and released when it returns. Fatal errors
    /// are handed back to the caller instead of being logged.
    fn process_job<T>(
        id: usize,
        job: T,
        processor: &dyn Processor<T>,
        stats: &WorkerStats,
    ) -> Option<PoolError> {
        let start = Instant::now();
        let mut fatal = None;

        let outcome = catch_unwind(AssertUnwindSafe(|| processor.process(job)));

        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(())) => {
                stats.increment_processed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, true);
            }
            Ok(Err(e)) => {
                if e.is_fatal() {
                    fatal = Some(e);
                } else if e.is_per_file() {
                    log::warn!("{}", e);
                } else {
                    log::error!("worker {}: {} failed: {}", id, processor.name(), e);
                }
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, false);
                stats.increment_failed();
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                log::error!(
                    "worker {}: {} panicked: {}",
                    id,
                    processor.name(),
                    panic_msg
                );
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                stats.increment_panicked();
            }
        }

        stats.add_processing_time(elapsed.as_micros() as u64);
        fatal
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                if thread.join().is_err() {
                    log::error!("worker {} panicked during shutdown", self.id);
                }
            } else {
                log::warn!(
                    "worker {} dropped while still running; thread detached",
                    self.id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureProcessor;
    use crossbeam_channel::unbounded;

    fn queue(capacity: usize) -> Arc<BoundedQueue<u32>> {
        Arc::new(BoundedQueue::new(capacity).expect("Failed to create queue"))
    }

    fn abort() -> Arc<AbortSignal> {
        Arc::new(AbortSignal::new())
    }

    #[test]
    fn test_worker_creation() {
        let queue = queue(4);
        let processor: Arc<dyn Processor<u32>> = Arc::new(ClosureProcessor::new(|_: u32| Ok(())));

        let worker = Worker::spawn(0, "worker", Arc::clone(&queue), processor, abort())
            .expect("Failed to create worker");
        assert_eq!(worker.id(), 0);

        // Close queue to trigger worker shutdown
        queue.close();
        worker.join().expect("Failed to join worker");
    }

    #[test]
    fn test_worker_job_execution() {
        let queue = queue(4);
        let (done_tx, done_rx) = unbounded();
        let processor: Arc<dyn Processor<u32>> = Arc::new(ClosureProcessor::new(move |job: u32| {
            done_tx.send(job).unwrap();
            Ok(())
        }));

        let worker = Worker::spawn(0, "worker", Arc::clone(&queue), processor, abort())
            .expect("Failed to create worker");
        let stats = worker.stats();

        queue.push(42).expect("Failed to push job");
        assert_eq!(done_rx.recv().unwrap(), 42);

        queue.close();
        worker.join().expect("Failed to join worker");

        assert_eq!(stats.get_jobs_processed(), 1);
        assert_eq!(stats.get_jobs_failed(), 0);
    }

    #[test]
    fn test_worker_drains_after_close() {
        let queue = queue(8);
        for i in 0..8 {
            queue.push(i).unwrap();
        }
        queue.close();

        let processor: Arc<dyn Processor<u32>> = Arc::new(ClosureProcessor::new(|_: u32| Ok(())));
        let worker = Worker::spawn(0, "worker", Arc::clone(&queue), processor, abort()).unwrap();
        let stats = worker.stats();
        worker.join().unwrap();

        assert_eq!(stats.get_jobs_processed(), 8);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_worker_error_and_panic_handling() {
        let queue = queue(4);
        let processor: Arc<dyn Processor<u32>> = Arc::new(ClosureProcessor::new(|job: u32| {
            match job {
                0 => Err(PoolError::other("bad job")),
                1 => panic!("Intentional panic for testing"),
                _ => Ok(()),
            }
        }));

        let worker = Worker::spawn(0, "worker", Arc::clone(&queue), processor, abort()).unwrap();
        let stats = worker.stats();

        queue.push(0).unwrap();
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.close();
        worker.join().expect("Worker should survive a panicking job");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.jobs_panicked, 1);
        assert_eq!(snapshot.jobs_processed, 1);
        assert_eq!(snapshot.jobs_handled(), 3);
    }

    #[test]
    fn test_fatal_error_stops_worker_and_closes_queue() {
        let queue = queue(8);
        for i in 0..8 {
            queue.push(i).unwrap();
        }

        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let processor: Arc<dyn Processor<u32>> = Arc::new(ClosureProcessor::new(move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PoolError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "reader gone",
            )))
        }));

        let signal = abort();
        let worker = Worker::spawn(0, "worker", Arc::clone(&queue), processor, Arc::clone(&signal))
            .unwrap();
        let stats = worker.stats();
        worker.join().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.get_jobs_failed(), 1);
        assert!(queue.is_closed());
        assert_eq!(queue.len(), 7);
        assert!(signal.is_tripped());
        assert!(matches!(signal.take(), Some(PoolError::Write(_))));
    }

    #[test]
    fn test_abort_signal_keeps_first_error() {
        let signal = AbortSignal::new();
        assert!(!signal.is_tripped());
        assert!(signal.trip(PoolError::other("first")));
        assert!(!signal.trip(PoolError::other("second")));
        assert!(signal.is_tripped());
        assert_eq!(signal.take().map(|e| e.to_string()), Some("first".to_string()));
    }
}
