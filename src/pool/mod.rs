//! Worker pool and worker implementations

pub mod worker;
pub mod worker_pool;

pub use worker::{AbortSignal, Worker, WorkerStats, WorkerStatsSnapshot};
pub use worker_pool::{PoolConfig, PoolStats, WorkerPool, DEFAULT_QUEUE_CAPACITY};
