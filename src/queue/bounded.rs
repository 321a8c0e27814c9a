//! Fixed-capacity FIFO ring buffer with blocking push and pop.

use super::{Popped, PushError, TryPop};
use crate::core::{PoolError, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;

/// Ring state. Only ever touched with the queue lock held.
struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
    closed: bool,
}

impl<T> Ring<T> {
    fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    fn push_back(&mut self, job: T) {
        debug_assert!(!self.is_full());
        self.slots[self.tail] = Some(job);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let job = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        job
    }
}

/// A bounded FIFO queue of opaque jobs.
///
/// One mutex guards the ring indices, the count, and the closed flag. Two
/// condition variables park producers while the ring is full and consumers
/// while it is empty. The lock only covers bookkeeping; jobs are processed
/// after they leave the queue.
///
/// # Example
///
/// ```rust
/// use rust_job_queue::queue::{BoundedQueue, PushError, TryPop};
///
/// let queue = BoundedQueue::new(2).unwrap();
/// queue.push(1).unwrap();
/// queue.push(2).unwrap();
///
/// // Queue is now full - try_push hands the job back
/// assert!(matches!(queue.try_push(3), Err(PushError::Full(3))));
/// assert_eq!(queue.try_pop(), TryPop::Job(1));
/// ```
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a new queue with room for `capacity` jobs.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidCapacity`] if `capacity` is 0
    /// - [`PoolError::Allocation`] if the slots cannot be reserved
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PoolError::invalid_capacity(capacity));
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|e| PoolError::allocation(capacity, e))?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Pushes a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] with the job if the queue is closed,
    /// either before the call or while this call was waiting for space.
    pub fn push(&self, job: T) -> std::result::Result<(), PushError<T>> {
        let mut ring = self.ring.lock();
        while ring.is_full() && !ring.closed {
            self.not_full.wait(&mut ring);
        }
        if ring.closed {
            return Err(PushError::Closed(job));
        }

        ring.push_back(job);
        #[cfg(feature = "tracing")]
        let depth = ring.count;
        drop(ring);

        self.not_empty.notify_one();
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_push(depth);
        Ok(())
    }

    /// Attempts to push a job without blocking.
    ///
    /// # Errors
    ///
    /// - [`PushError::Closed`] if the queue has been closed
    /// - [`PushError::Full`] if every slot is taken
    pub fn try_push(&self, job: T) -> std::result::Result<(), PushError<T>> {
        let mut ring = self.ring.lock();
        if ring.closed {
            return Err(PushError::Closed(job));
        }
        if ring.is_full() {
            return Err(PushError::Full(job));
        }

        ring.push_back(job);
        drop(ring);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the oldest job, blocking while the queue is empty and open.
    ///
    /// Once the queue is closed the remaining jobs are still handed out in
    /// order; after the last one every call returns [`Popped::Drained`].
    pub fn pop(&self) -> Popped<T> {
        let mut ring = self.ring.lock();
        while ring.count == 0 && !ring.closed {
            self.not_empty.wait(&mut ring);
        }

        match ring.pop_front() {
            Some(job) => {
                #[cfg(feature = "tracing")]
                let depth = ring.count;
                drop(ring);

                self.not_full.notify_one();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_pop(depth);
                Popped::Job(job)
            }
            None => Popped::Drained,
        }
    }

    /// Attempts to pop the oldest job without blocking.
    pub fn try_pop(&self) -> TryPop<T> {
        let mut ring = self.ring.lock();
        match ring.pop_front() {
            Some(job) => {
                drop(ring);
                self.not_full.notify_one();
                TryPop::Job(job)
            }
            None if ring.closed => TryPop::Drained,
            None => TryPop::Empty,
        }
    }

    /// Closes the queue.
    ///
    /// Further pushes fail immediately, blocked pushers and poppers are all
    /// woken, and queued jobs stay available to [`pop`](Self::pop). Returns
    /// `true` for the call that actually closed the queue.
    pub fn close(&self) -> bool {
        let mut ring = self.ring.lock();
        let first = !ring.closed;
        ring.closed = true;
        drop(ring);

        self.not_full.notify_all();
        self.not_empty.notify_all();
        first
    }

    /// Releases the queue's storage.
    ///
    /// Taking `self` by value means no other thread can still be waiting on
    /// the queue. Shared queues reach this through `Arc::try_unwrap` after
    /// every worker has been joined.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotClosed`] if the queue was never closed. Any jobs
    /// still queued are dropped either way.
    pub fn destroy(self) -> Result<()> {
        let ring = self.ring.into_inner();
        if ring.closed {
            Ok(())
        } else {
            Err(PoolError::not_closed(ring.count))
        }
    }

    /// Returns the maximum number of queued jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of jobs currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    /// Returns true if no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if every slot is taken.
    pub fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.ring.lock().closed
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &ring.count)
            .field("closed", &ring.closed)
            .finish()
    }
}
