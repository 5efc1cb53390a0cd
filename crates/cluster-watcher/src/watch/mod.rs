//! Per-cluster pod watches and the loop that keeps them in line with the store.

pub mod backoff;
pub mod pool;
pub mod reconciler;
pub mod worker;

pub use backoff::Backoff;
pub use backoff::BackoffConfig;
pub use pool::WorkerHandle;
pub use pool::WorkerPool;
pub use reconciler::ActiveWatch;
pub use reconciler::ReconcileConfig;
pub use reconciler::ReconcileError;
pub use reconciler::ReconcileSummary;
pub use reconciler::ReconciliationLoop;
pub use worker::WatchWorker;
pub use worker::WorkerContext;
