use std::sync::Arc;

use crate::infrastructure::k8s::WatchStreamFactory;
use crate::infrastructure::ClusterStore;
use crate::notifier::EventNotifier;

/// Application dependencies - simple struct with Arc-wrapped services
pub struct ApplicationServices {
    pub cluster_store: Arc<dyn ClusterStore>,
    pub watch_streams: Arc<dyn WatchStreamFactory>,
    pub notifier: Arc<EventNotifier>,
}
