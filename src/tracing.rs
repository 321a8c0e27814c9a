//! Tracing integration for observability.
//!
//! Queue depth, worker activity, and pool lifecycle events are emitted as
//! `tracing` events when the `tracing` feature is enabled. None of this is part
//! of the queue or pool contract; with the feature off the hooks compile away.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_job_queue::prelude::*;
//! use rust_job_queue::tracing::TracedProcessor;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_job_queue=trace".parse().unwrap()))
//!     .init();
//!
//! let processor = TracedProcessor::new(SearchProcessor::new("needle", sink));
//! ```

use crate::core::{Processor, Result};
#[cfg(feature = "tracing")]
use std::time::Duration;

/// A processor wrapper that carries a tracing span into worker threads.
///
/// The span current at construction time is captured and entered around
/// every `process` call, so events emitted by the wrapped processor nest under
/// the span of whoever built the pipeline.
pub struct TracedProcessor<P> {
    inner: P,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<P> TracedProcessor<P> {
    /// Creates a TracedProcessor wrapping the given processor.
    pub fn new(processor: P) -> Self {
        Self {
            inner: processor,
            #[cfg(feature = "tracing")]
            span: tracing::Span::current(),
        }
    }

    /// Creates a TracedProcessor with a specific span.
    #[cfg(feature = "tracing")]
    pub fn with_span(processor: P, span: tracing::Span) -> Self {
        Self {
            inner: processor,
            span,
        }
    }

    /// Returns the wrapped processor.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<T, P: Processor<T>> Processor<T> for TracedProcessor<P> {
    fn process(&self, job: T) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.process(job)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
#[cfg(feature = "tracing")]
pub mod metrics {
    use super::*;

    /// Records a job entering the queue.
    #[inline]
    pub fn record_push(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_pushed = 1,
            gauge.queue_depth = queue_depth as i64,
            "job pushed"
        );
    }

    /// Records a job leaving the queue.
    #[inline]
    pub fn record_pop(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_popped = 1,
            gauge.queue_depth = queue_depth as i64,
            "job popped"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = 1,
            worker_id = worker_id,
            "worker busy"
        );
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity = queue_capacity,
            "worker pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_failed: u64) {
        tracing::info!(
            jobs_processed = jobs_processed,
            jobs_failed = jobs_failed,
            "worker pool joined"
        );
    }
}
