//! Processor trait invoked by workers for each popped job

use crate::core::error::Result;
use std::fmt;
use std::marker::PhantomData;

/// Per-job processing routine run by every worker in a pool.
///
/// The worker owns the job for the duration of the call and drops it
/// afterwards. Implementations are shared between all workers, so any mutable
/// state they touch must carry its own lock.
pub trait Processor<T>: Send + Sync {
    /// Process one job
    ///
    /// # Errors
    ///
    /// Returns an error if the job could not be processed. The worker logs the
    /// error and moves on to the next job.
    fn process(&self, job: T) -> Result<()>;

    /// Get the processor's name for logging and statistics
    fn name(&self) -> &str {
        "Processor"
    }
}

impl<'a, T> fmt::Debug for dyn Processor<T> + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processor({})", self.name())
    }
}

/// Helper to build a processor from a closure
pub struct ClosureProcessor<T, F>
where
    F: Fn(T) -> Result<()> + Send + Sync,
{
    closure: F,
    name: String,
    _job: PhantomData<fn(T)>,
}

impl<T, F> ClosureProcessor<T, F>
where
    F: Fn(T) -> Result<()> + Send + Sync,
{
    /// Create a new closure processor
    pub fn new(closure: F) -> Self {
        Self::with_name(closure, "ClosureProcessor")
    }

    /// Create a new closure processor with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure,
            name: name.into(),
            _job: PhantomData,
        }
    }
}

impl<T, F> Processor<T> for ClosureProcessor<T, F>
where
    F: Fn(T) -> Result<()> + Send + Sync,
{
    fn process(&self, job: T) -> Result<()> {
        (self.closure)(job)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
