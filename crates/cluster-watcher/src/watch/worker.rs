use std::sync::Arc;

use api_types::ClusterRecord;
use chrono::DateTime;
use chrono::Utc;
use error_stack::Report;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::backoff::Backoff;
use super::backoff::BackoffConfig;
use crate::domain::event;
use crate::domain::PodEvent;
use crate::infrastructure::k8s::PodWatchStream;
use crate::infrastructure::k8s::WatchError;
use crate::infrastructure::k8s::WatchStreamFactory;
use crate::notifier::EventNotifier;

/// Dependencies shared by every watch worker.
pub struct WorkerContext {
    pub streams: Arc<dyn WatchStreamFactory>,
    pub notifier: Arc<EventNotifier>,
    pub backoff: BackoffConfig,
}

/// How one stream iteration ended.
enum StreamEnd {
    Stopped,
    Ended,
    Failed(Report<WatchError>),
}

/// Consumes the pod watch stream of a single cluster until stopped.
pub struct WatchWorker {
    cluster: ClusterRecord,
    ctx: Arc<WorkerContext>,
}

impl WatchWorker {
    pub fn new(cluster: ClusterRecord, ctx: Arc<WorkerContext>) -> Self {
        Self { cluster, ctx }
    }

    /// Watches until `stop` is cancelled. Stream failures are retried forever
    /// with exponential backoff.
    ///
    /// Reopened watches resume from the last seen resource version, so the pod
    /// backlog is replayed only by the first watch and after the version expired.
    #[tracing::instrument(skip_all, fields(cluster_id = %self.cluster.id))]
    pub async fn run(self, stop: CancellationToken) {
        let reference_time = event::reference_time(Utc::now());
        let mut backoff = Backoff::new(self.ctx.backoff);
        let mut resume_from: Option<String> = None;
        info!(api_server = %self.cluster.api_server, "Watch worker started");

        while !stop.is_cancelled() {
            let stream = self.ctx.streams.open(&self.cluster, resume_from.as_deref());
            let end = self
                .consume(stream, reference_time, &mut resume_from, &stop)
                .await;
            let delay = match end {
                StreamEnd::Stopped => break,
                StreamEnd::Ended => {
                    backoff.reset();
                    debug!(resource_version = ?resume_from, "Pod watch ended, resuming");
                    backoff.initial()
                }
                StreamEnd::Failed(e) => {
                    if e.current_context().is_expired() {
                        resume_from = None;
                    }
                    let delay = backoff.next_delay();
                    warn!(
                        delay_sec = delay.as_secs_f64(),
                        "Pod watch failed, retrying: {e:?}"
                    );
                    delay
                }
            };

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Watch worker stopped");
    }

    /// Reads events until the stream ends or fails, or until `stop` fires.
    /// `resume_from` follows the resource version of every event read.
    ///
    /// The stream is dropped on return, closing the connection even when a
    /// read was still pending.
    async fn consume(
        &self,
        mut stream: PodWatchStream,
        reference_time: DateTime<Utc>,
        resume_from: &mut Option<String>,
        stop: &CancellationToken,
    ) -> StreamEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => return StreamEnd::Stopped,
                next = stream.next() => next,
            };

            let event = match next {
                None => return StreamEnd::Ended,
                Some(Err(e)) => return StreamEnd::Failed(e),
                Some(Ok(event)) => event,
            };
            if let Some(version) = event.resource_version() {
                *resume_from = Some(version.to_string());
            }

            if let Some(event) = PodEvent::qualify(&event, &self.cluster, reference_time) {
                self.ctx.notifier.notify(&event).await;
            }
            if stop.is_cancelled() {
                return StreamEnd::Stopped;
            }
        }
    }
}
