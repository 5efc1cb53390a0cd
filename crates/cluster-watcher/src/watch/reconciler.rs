use core::error::Error;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use api_types::ClusterRecord;
use error_stack::Report;
use error_stack::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::pool::WorkerHandle;
use super::pool::WorkerPool;
use super::worker::WatchWorker;
use super::worker::WorkerContext;
use crate::domain::ClusterDiff;
use crate::infrastructure::ClusterStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub tick_interval: Duration,
    /// pause after a failed tick
    pub recovery_delay: Duration,
    /// how long shutdown waits for workers to exit
    pub shutdown_timeout: Duration,
    pub max_workers: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            recovery_delay: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
            max_workers: 20,
        }
    }
}

#[derive(Debug, derive_more::Display)]
pub enum ReconcileError {
    #[display("Failed to load the registered clusters")]
    StoreUnavailable,
    #[display("{abandoned} watch workers did not stop within {timeout:?}")]
    ShutdownTimeout { abandoned: usize, timeout: Duration },
}

impl Error for ReconcileError {}

/// A cluster being watched: the record its worker was started with plus the
/// worker's stop signal and task handle.
#[derive(Debug)]
pub struct ActiveWatch {
    pub cluster: ClusterRecord,
    pub worker: WorkerHandle,
}

/// Cluster ids touched by one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub restarted: Vec<String>,
    /// workers that died without being stopped and were started again
    pub revived: Vec<String>,
}

impl ReconcileSummary {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
            && self.stopped.is_empty()
            && self.restarted.is_empty()
            && self.revived.is_empty()
    }
}

/// Keeps one watch worker running per registered cluster.
///
/// The loop is the only owner of the active set; workers never see it.
pub struct ReconciliationLoop {
    store: Arc<dyn ClusterStore>,
    ctx: Arc<WorkerContext>,
    config: ReconcileConfig,
    pool: WorkerPool,
    active: HashMap<String, ActiveWatch>,
}

impl ReconciliationLoop {
    pub fn new(
        store: Arc<dyn ClusterStore>,
        ctx: Arc<WorkerContext>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            ctx,
            pool: WorkerPool::new(config.max_workers),
            config,
            active: HashMap::new(),
        }
    }

    pub fn active_watch(&self, cluster_id: &str) -> Option<&ActiveWatch> {
        self.active.get(cluster_id)
    }

    /// Ids of watched clusters, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Runs one tick: diffs the store against the active set and applies it.
    ///
    /// A store failure leaves the active set untouched.
    pub async fn reconcile(&mut self) -> Result<ReconcileSummary, Report<ReconcileError>> {
        let desired = self
            .store
            .list()
            .await
            .change_context(ReconcileError::StoreUnavailable)?;

        self.pool.reap();
        let diff = ClusterDiff::compute(desired, self.active.values().map(|w| &w.cluster));
        let mut summary = ReconcileSummary::default();

        for cluster_id in diff.removed {
            if let Some(watch) = self.active.remove(&cluster_id) {
                watch.worker.stop.cancel();
                info!(cluster_id = %cluster_id, "Cluster removed, stopping watch");
                summary.stopped.push(cluster_id);
            }
        }

        for cluster in diff.restarted {
            if let Some(old) = self.active.remove(&cluster.id) {
                old.worker.stop.cancel();
            }
            info!(cluster_id = %cluster.id, "Cluster connectivity changed, restarting watch");
            summary.restarted.push(cluster.id.clone());
            self.start(cluster);
        }

        let dead: Vec<ClusterRecord> = self
            .active
            .values()
            .filter(|w| w.worker.is_finished())
            .map(|w| w.cluster.clone())
            .collect();
        for cluster in dead {
            warn!(cluster_id = %cluster.id, "Watch worker exited unexpectedly, restarting");
            summary.revived.push(cluster.id.clone());
            self.start(cluster);
        }

        for cluster in diff.added {
            info!(cluster_id = %cluster.id, "New cluster, starting watch");
            summary.started.push(cluster.id.clone());
            self.start(cluster);
        }

        Ok(summary)
    }

    fn start(&mut self, cluster: ClusterRecord) {
        let worker = WatchWorker::new(cluster.clone(), self.ctx.clone());
        let handle = self.pool.spawn(|stop| worker.run(stop));
        self.active.insert(cluster.id.clone(), ActiveWatch {
            cluster,
            worker: handle,
        });
    }

    /// Reconciles every tick until `stop` is cancelled, then stops all workers
    /// and waits for them up to the shutdown timeout.
    #[tracing::instrument(skip_all, fields(tick_ms = self.config.tick_interval.as_millis() as u64))]
    pub async fn run(mut self, stop: CancellationToken) -> Result<(), Report<ReconcileError>> {
        info!("Reconciliation loop started");

        while !stop.is_cancelled() {
            let pause = match self.reconcile().await {
                Ok(summary) => {
                    if !summary.is_empty() {
                        debug!(
                            watching = self.active.len(),
                            tasks = self.pool.len(),
                            "Reconciled: {summary:?}"
                        );
                    }
                    self.config.tick_interval
                }
                Err(e) => {
                    error!(
                        "Reconciliation failed, retrying in {:?}: {e:?}",
                        self.config.recovery_delay
                    );
                    self.config.recovery_delay
                }
            };

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(watching = self.active.len(), "Stop requested, shutting down watches");
        self.active.clear();
        let timeout = self.config.shutdown_timeout;
        match self.pool.shutdown(timeout).await {
            0 => {
                info!("Reconciliation loop stopped");
                Ok(())
            }
            abandoned => Err(Report::new(ReconcileError::ShutdownTimeout {
                abandoned,
                timeout,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;
    use futures::StreamExt;
    use similar_asserts::assert_eq;
    use test_log::test;
    use tokio::time::Instant;

    use super::*;
    use crate::infrastructure::StoreError;
    use crate::notifier::mock::MockPlatform;
    use crate::watch::worker::tests::cluster;
    use crate::watch::worker::tests::context;
    use crate::watch::worker::tests::FakeStreams;

    #[derive(Default)]
    struct FakeStore {
        clusters: Mutex<Vec<ClusterRecord>>,
        failing: AtomicBool,
        calls: Mutex<Vec<Instant>>,
    }

    impl FakeStore {
        fn with(clusters: Vec<ClusterRecord>) -> Arc<Self> {
            let store = Self::default();
            store.set(clusters);
            Arc::new(store)
        }

        fn set(&self, clusters: Vec<ClusterRecord>) {
            *self.clusters.lock().unwrap() = clusters;
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClusterStore for FakeStore {
        async fn list(&self) -> Result<Vec<ClusterRecord>, Report<StoreError>> {
            self.calls.lock().unwrap().push(Instant::now());
            if self.failing.load(Ordering::SeqCst) {
                return Err(Report::new(StoreError::Read {
                    path: "fake".to_string(),
                }));
            }
            Ok(self.clusters.lock().unwrap().clone())
        }
    }

    fn reconciler(store: &Arc<FakeStore>, streams: &Arc<FakeStreams>) -> ReconciliationLoop {
        let platform = Arc::new(MockPlatform::new());
        ReconciliationLoop::new(
            store.clone(),
            context(streams.clone(), &platform),
            ReconcileConfig::default(),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test(tokio::test(start_paused = true))]
    async fn first_appearance_starts_one_worker() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        let streams = Arc::new(FakeStreams::idle());
        let mut reconciler = reconciler(&store, &streams);

        let summary = reconciler.reconcile().await.unwrap();
        assert_eq!(summary.started, vec!["c1".to_string()]);
        assert_eq!(reconciler.active_ids(), vec!["c1".to_string()]);

        let summary = reconciler.reconcile().await.unwrap();
        assert!(summary.is_empty());
        settle().await;
        assert_eq!(streams.open_count(), 1);
    }

    #[test(tokio::test(start_paused = true))]
    async fn removed_cluster_is_stopped() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        let streams = Arc::new(FakeStreams::idle());
        let mut reconciler = reconciler(&store, &streams);
        reconciler.reconcile().await.unwrap();
        let stop = reconciler.active_watch("c1").unwrap().worker.stop.clone();

        store.set(vec![]);
        let summary = reconciler.reconcile().await.unwrap();
        assert_eq!(summary.stopped, vec!["c1".to_string()]);
        assert!(reconciler.active_ids().is_empty());
        assert!(stop.is_cancelled());
    }

    #[test(tokio::test(start_paused = true))]
    async fn token_change_replaces_worker() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        let streams = Arc::new(FakeStreams::idle());
        let mut reconciler = reconciler(&store, &streams);
        reconciler.reconcile().await.unwrap();
        settle().await;
        let old_stop = reconciler.active_watch("c1").unwrap().worker.stop.clone();

        store.set(vec![cluster("c1", "t2")]);
        let summary = reconciler.reconcile().await.unwrap();
        assert_eq!(summary.restarted, vec!["c1".to_string()]);
        assert!(old_stop.is_cancelled());

        let active = reconciler.active_watch("c1").unwrap();
        assert_eq!(active.cluster.token, "t2");
        assert!(!active.worker.stop.is_cancelled());

        settle().await;
        assert_eq!(
            streams.opened_with(),
            vec![
                ("c1".to_string(), "t1".to_string()),
                ("c1".to_string(), "t2".to_string()),
            ]
        );
    }

    #[test(tokio::test(start_paused = true))]
    async fn store_failure_keeps_active_set() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        let streams = Arc::new(FakeStreams::idle());
        let mut reconciler = reconciler(&store, &streams);
        reconciler.reconcile().await.unwrap();

        store.set_failing(true);
        let err = reconciler.reconcile().await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            ReconcileError::StoreUnavailable
        ));
        assert_eq!(reconciler.active_ids(), vec!["c1".to_string()]);
        assert!(!reconciler
            .active_watch("c1")
            .unwrap()
            .worker
            .stop
            .is_cancelled());
    }

    #[test(tokio::test(start_paused = true))]
    async fn dead_worker_is_restarted() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        let streams = Arc::new(FakeStreams::new(|n, _| {
            if n == 0 {
                panic!("stream factory crashed");
            }
            stream::pending().boxed()
        }));
        let mut reconciler = reconciler(&store, &streams);
        reconciler.reconcile().await.unwrap();
        settle().await;
        assert!(reconciler.active_watch("c1").unwrap().worker.is_finished());

        let summary = reconciler.reconcile().await.unwrap();
        assert_eq!(summary.revived, vec!["c1".to_string()]);
        settle().await;
        assert_eq!(streams.open_count(), 2);
        assert!(!reconciler.active_watch("c1").unwrap().worker.is_finished());
    }

    #[test(tokio::test(start_paused = true))]
    async fn run_ticks_and_backs_off_after_store_failure() {
        let store = FakeStore::with(vec![cluster("c1", "t1")]);
        store.set_failing(true);
        let streams = Arc::new(FakeStreams::idle());
        let stop = CancellationToken::new();
        let handle = tokio::spawn(reconciler(&store, &streams).run(stop.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        store.set_failing(false);
        tokio::time::sleep(Duration::from_millis(7400)).await;
        stop.cancel();
        handle.await.unwrap().unwrap();

        let calls = store.call_times();
        let offsets: Vec<Duration> = calls.iter().map(|t| *t - calls[0]).collect();
        assert_eq!(
            offsets,
            vec![
                Duration::from_secs(0),
                Duration::from_secs(5),
                Duration::from_secs(6),
                Duration::from_secs(7),
            ]
        );
        assert_eq!(streams.open_count(), 1);
    }

    #[test(tokio::test(start_paused = true))]
    async fn stop_request_shuts_down_all_workers() {
        let store = FakeStore::with(vec![
            cluster("c1", "t1"),
            cluster("c2", "t2"),
            cluster("c3", "t3"),
        ]);
        let streams = Arc::new(FakeStreams::idle());
        let stop = CancellationToken::new();
        let handle = tokio::spawn(reconciler(&store, &streams).run(stop.clone()));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(streams.open_count(), 3);

        let requested = Instant::now();
        stop.cancel();
        handle.await.unwrap().unwrap();
        assert!(requested.elapsed() < Duration::from_secs(1));
        assert_eq!(store.call_times().len(), 4);
    }
}
