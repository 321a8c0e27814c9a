//! Fixed-size worker pool bound to one queue and one processor

use crate::core::{PoolError, Processor, Result};
use crate::pool::worker::{AbortSignal, Worker, WorkerStats, WorkerStatsSnapshot};
use crate::queue::BoundedQueue;
use std::sync::Arc;

/// Queue capacity used when none is configured
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Configuration for a worker pool and the queue that feeds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_threads: usize,
    /// Maximum number of queued jobs
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: if num_threads == 0 {
                num_cpus::get()
            } else {
                num_threads
            },
            ..Default::default()
        }
    }

    /// Set queue capacity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(PoolError::invalid_config(
                "num_threads",
                "Number of threads must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Counters collected from every worker after the pool was joined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// One entry per worker, in worker id order
    pub workers: Vec<WorkerStatsSnapshot>,
}

impl PoolStats {
    /// Jobs processed successfully across all workers
    pub fn jobs_processed(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_processed).sum()
    }

    /// Jobs whose processor returned an error
    pub fn jobs_failed(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_failed).sum()
    }

    /// Jobs whose processor panicked
    pub fn jobs_panicked(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_panicked).sum()
    }

    /// Every job popped from the queue, whatever its outcome
    pub fn jobs_handled(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_handled()).sum()
    }
}

/// A fixed set of worker threads draining one [`BoundedQueue`].
///
/// # Shutdown Mechanism
///
/// The pool never closes or destroys the queue itself during normal
/// operation. The owner closes the queue once production is finished and then
/// calls [`join_all`](Self::join_all); every worker exits after it pops
/// [`Popped::Drained`](crate::queue::Popped::Drained).
///
/// If the pool is dropped without being joined, it closes the queue and joins
/// the workers so no thread outlives it.
pub struct WorkerPool<T: Send + 'static> {
    config: PoolConfig,
    queue: Arc<BoundedQueue<T>>,
    workers: Vec<Worker>,
    abort: Arc<AbortSignal>,
}

impl<T: Send + 'static> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("workers", &self.workers.len())
            .field("aborted", &self.abort.is_tripped())
            .finish()
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start `config.num_threads` workers popping from `queue`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if the configuration does not validate
    /// - [`PoolError::Spawn`] if a thread cannot be created; the queue is closed
    ///   and the workers started so far are joined before returning
    pub fn start(
        config: &PoolConfig,
        queue: Arc<BoundedQueue<T>>,
        processor: Arc<dyn Processor<T>>,
    ) -> Result<Self> {
        config.validate()?;

        let abort = Arc::new(AbortSignal::new());
        let mut workers = Vec::with_capacity(config.num_threads);
        for id in 0..config.num_threads {
            match Worker::spawn(
                id,
                &config.thread_name_prefix,
                Arc::clone(&queue),
                Arc::clone(&processor),
                Arc::clone(&abort),
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    queue.close();
                    for worker in workers {
                        if let Err(join_err) = worker.join() {
                            log::error!("{}", join_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        log::debug!(
            "started {} workers on queue of capacity {}",
            workers.len(),
            queue.capacity()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(workers.len(), queue.capacity());

        Ok(Self {
            config: config.clone(),
            queue,
            workers,
            abort,
        })
    }

    /// Get the number of worker threads
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit.
    ///
    /// Call this after closing the queue. Blocks until each worker has seen
    /// the queue closed and drained, or has stopped after a fatal job error.
    ///
    /// # Errors
    ///
    /// - the first [`PoolError::Join`] encountered; the remaining workers are
    ///   still joined
    /// - the fatal error that aborted the run, e.g. [`PoolError::Write`]
    pub fn join_all(mut self) -> Result<PoolStats> {
        let workers = std::mem::take(&mut self.workers);
        let stats: Vec<Arc<WorkerStats>> = workers.iter().map(Worker::stats).collect();

        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                log::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        if let Some(e) = self.abort.take() {
            return Err(e);
        }

        let pool_stats = PoolStats {
            workers: stats.iter().map(|s| s.snapshot()).collect(),
        };
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            pool_stats.jobs_processed(),
            pool_stats.jobs_failed(),
        );
        Ok(pool_stats)
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        log::warn!(
            "worker pool '{}' dropped without join_all; closing queue",
            self.config.thread_name_prefix
        );
        self.queue.close();
        for worker in std::mem::take(&mut self.workers) {
            if let Err(e) = worker.join() {
                log::error!("{}", e);
            }
        }
    }
}
