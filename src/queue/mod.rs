//! Bounded job queue shared between one producer and a pool of workers.
//!
//! The queue is generic over the job type and never looks inside a job. It
//! only stores handles and moves ownership: producer to queue on
//! [`BoundedQueue::push`], queue to worker on [`BoundedQueue::pop`].
//!
//! # Shutdown
//!
//! Shutdown is split into three steps owned by whoever created the queue:
//!
//! 1. [`BoundedQueue::close`] stops new pushes and wakes every waiter.
//! 2. Workers keep popping until they see [`Popped::Drained`], then exit and
//!    are joined.
//! 3. [`BoundedQueue::destroy`] releases the storage once nobody else holds it.
//!
//! ```rust
//! use rust_job_queue::queue::{BoundedQueue, Popped, PushError};
//!
//! let queue = BoundedQueue::new(2).unwrap();
//! queue.push("a").unwrap();
//! queue.close();
//!
//! assert!(matches!(queue.push("b"), Err(PushError::Closed("b"))));
//! assert_eq!(queue.pop(), Popped::Job("a"));
//! assert_eq!(queue.pop(), Popped::Drained);
//! ```

mod bounded;

pub use bounded::BoundedQueue;

use std::fmt;

/// Outcome of a blocking [`BoundedQueue::pop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped<T> {
    /// The next job in FIFO order
    Job(T),
    /// The queue is closed and every queued job has been handed out
    Drained,
}

impl<T> Popped<T> {
    /// Returns the job, or `None` once the queue is drained.
    pub fn into_job(self) -> Option<T> {
        match self {
            Popped::Job(job) => Some(job),
            Popped::Drained => None,
        }
    }

    /// Whether this is the drained outcome
    pub fn is_drained(&self) -> bool {
        matches!(self, Popped::Drained)
    }
}

/// Outcome of a non-blocking [`BoundedQueue::try_pop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryPop<T> {
    /// The next job in FIFO order
    Job(T),
    /// The queue is open but currently holds no jobs
    Empty,
    /// The queue is closed and every queued job has been handed out
    Drained,
}

/// A push that was refused. The rejected job is handed back to the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue is full (non-blocking push only)
    Full(T),
    /// The queue has been closed
    Closed(T),
}

impl<T> PushError<T> {
    /// Takes the rejected job back.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(job) | PushError::Closed(job) => job,
        }
    }

    /// Whether the push failed because the queue was closed
    pub fn is_closed(&self) -> bool {
        matches!(self, PushError::Closed(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "Full(..)"),
            PushError::Closed(_) => write!(f, "Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "queue is full"),
            PushError::Closed(_) => write!(f, "queue is closed"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}
