use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

/// Handle the pool returns for each spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    pub stop: CancellationToken,
    pub task: AbortHandle,
}

impl WorkerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Supervised set of cancellable worker tasks.
///
/// Every worker gets a child of the pool's root token, so one cancel of the
/// root signals all of them. At most `max_workers` run at once; the rest wait
/// for a permit and can still be stopped while waiting.
pub struct WorkerPool {
    root: CancellationToken,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            root: CancellationToken::new(),
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Spawns a worker built from its own stop token.
    pub fn spawn<F, Fut>(&mut self, make_worker: F) -> WorkerHandle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stop = self.root.child_token();
        let worker = make_worker(stop.clone());
        let permits = self.permits.clone();
        let waiting = stop.clone();

        let task = self.tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = waiting.cancelled() => return,
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };
            worker.await;
        });

        WorkerHandle { stop, task }
    }

    /// Collects workers that already exited; returns how many.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Watch worker panicked: {e}");
                }
            }
            reaped += 1;
        }
        reaped
    }

    /// Number of tasks not reaped yet, stopped-but-running ones included.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals every worker, then waits up to `timeout` for all of them.
    ///
    /// Workers still running at the deadline are aborted; returns how many.
    pub async fn shutdown(&mut self, timeout: Duration) -> usize {
        info!(workers = self.tasks.len(), "Stopping all watch workers");
        self.root.cancel();

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    error!("Watch worker failed during shutdown: {e}");
                }
            }
        })
        .await
        .is_ok();
        if drained {
            return 0;
        }

        let abandoned = self.tasks.len();
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        abandoned
    }
}
