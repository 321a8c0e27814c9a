//! Core types and traits shared by the queue, the pool, and the processors

pub mod error;
pub mod job;

pub use error::{PoolError, Result};
pub use job::{ClosureProcessor, Processor};
