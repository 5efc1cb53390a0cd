use api_types::ClusterRecord;
use error_stack::Report;
use futures::future;
use futures::stream::BoxStream;
use futures::StreamExt;
use futures::TryFutureExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;
use kube::api::WatchParams;
use kube::Api;
use tracing::debug;

use crate::domain::PodWatchEvent;
use crate::infrastructure::k8s::types::WatchError;
use crate::infrastructure::kube_client;

/// Live pod event feed of one cluster.
///
/// Dropping the stream closes the underlying connection, which is what unblocks a
/// worker parked on a pending read.
pub type PodWatchStream = BoxStream<'static, Result<PodWatchEvent, Report<WatchError>>>;

/// Opens per-cluster pod watch streams.
pub trait WatchStreamFactory: Send + Sync {
    /// Opens a watch of all pods in all namespaces.
    ///
    /// Without `resume_from` the watch starts by replaying every existing pod as
    /// `ADDED`. Connection failures surface as the first item of the stream.
    fn open(&self, cluster: &ClusterRecord, resume_from: Option<&str>) -> PodWatchStream;
}

/// Watches pods through the Kubernetes API of each registered cluster.
pub struct KubeWatchStreamFactory {
    accept_invalid_certs: bool,
}

impl KubeWatchStreamFactory {
    pub fn new(accept_invalid_certs: bool) -> Self {
        Self {
            accept_invalid_certs,
        }
    }
}

impl WatchStreamFactory for KubeWatchStreamFactory {
    fn open(&self, cluster: &ClusterRecord, resume_from: Option<&str>) -> PodWatchStream {
        let cluster = cluster.clone();
        let accept_invalid_certs = self.accept_invalid_certs;
        // "0" replays the current pods as ADDED before live events
        let version = resume_from.unwrap_or("0").to_string();

        async move {
            let client = kube_client::init_cluster_client(&cluster, accept_invalid_certs).await?;
            let api: Api<Pod> = Api::all(client);

            let params = WatchParams::default();
            let events = api
                .watch(&params, &version)
                .await
                .map_err(|e| watch_error(&cluster.id, "Failed to open pod watch", e))?;

            debug!(cluster_id = %cluster.id, resource_version = %version, "Pod watch opened");
            let cluster_id = cluster.id;
            Ok::<_, Report<WatchError>>(
                events.filter_map(move |event| future::ready(translate_event(&cluster_id, event))),
            )
        }
        .try_flatten_stream()
        .boxed()
    }
}

/// API rejections keep their status code so an expired resume version is
/// recognisable.
fn watch_error(cluster_id: &str, message: &str, e: kube::Error) -> Report<WatchError> {
    match e {
        kube::Error::Api(resp) => Report::new(WatchError::ApiError {
            cluster_id: cluster_id.to_string(),
            code: resp.code,
            message: resp.message,
        }),
        other => Report::new(other).change_context(WatchError::WatchFailed {
            cluster_id: cluster_id.to_string(),
            message: message.to_string(),
        }),
    }
}

fn translate_event(
    cluster_id: &str,
    event: Result<WatchEvent<Pod>, kube::Error>,
) -> Option<Result<PodWatchEvent, Report<WatchError>>> {
    match event {
        Ok(WatchEvent::Added(pod)) => Some(Ok(PodWatchEvent::Added(pod))),
        Ok(WatchEvent::Modified(pod)) => Some(Ok(PodWatchEvent::Modified(pod))),
        Ok(WatchEvent::Deleted(pod)) => Some(Ok(PodWatchEvent::Deleted(pod))),
        Ok(WatchEvent::Bookmark(bookmark)) => Some(Ok(PodWatchEvent::Bookmark {
            resource_version: bookmark.metadata.resource_version,
        })),
        Ok(WatchEvent::Error(e)) => Some(Err(Report::new(WatchError::ApiError {
            cluster_id: cluster_id.to_string(),
            code: e.code,
            message: e.message,
        }))),
        Err(e) => Some(Err(watch_error(cluster_id, "Watch stream error", e))),
    }
}
