pub mod cluster_store;
pub mod k8s;
pub mod kube_client;

pub use cluster_store::ClusterStore;
pub use cluster_store::FileClusterStore;
pub use cluster_store::StoreError;
