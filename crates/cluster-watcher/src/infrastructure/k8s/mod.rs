//! Kubernetes integration module.
//!
//! Opens one pod watch per registered cluster, across all namespaces, and maps the
//! raw watch events into [`PodWatchEvent`](crate::domain::PodWatchEvent)s.

pub mod pod_watch;
pub mod types;

pub use pod_watch::KubeWatchStreamFactory;
pub use pod_watch::PodWatchStream;
pub use pod_watch::WatchStreamFactory;
pub use types::WatchError;
