use api_types::ClusterRecord;
use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;

use crate::infrastructure::k8s::WatchError;

/// Builds an in-memory kubeconfig for a cluster registered by URL and bearer token.
pub fn cluster_kubeconfig(
    cluster: &ClusterRecord,
    accept_invalid_certs: bool,
) -> Result<Kubeconfig, Report<WatchError>> {
    let document = serde_json::json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": cluster.id,
            "cluster": {
                "server": cluster.api_server,
                "insecure-skip-tls-verify": accept_invalid_certs,
            },
        }],
        "users": [{
            "name": cluster.id,
            "user": { "token": cluster.token },
        }],
        "contexts": [{
            "name": cluster.id,
            "context": { "cluster": cluster.id, "user": cluster.id },
        }],
        "current-context": cluster.id,
    });

    serde_json::from_value(document).change_context(WatchError::ConnectionFailed {
        cluster_id: cluster.id.clone(),
        message: "Failed to build kubeconfig".to_string(),
    })
}

pub async fn init_cluster_client(
    cluster: &ClusterRecord,
    accept_invalid_certs: bool,
) -> Result<Client, Report<WatchError>> {
    let kubeconfig = cluster_kubeconfig(cluster, accept_invalid_certs)?;

    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .change_context(WatchError::ConnectionFailed {
            cluster_id: cluster.id.clone(),
            message: format!("Invalid API server config: {}", cluster.api_server),
        })?;

    Client::try_from(config).change_context(WatchError::ConnectionFailed {
        cluster_id: cluster.id.clone(),
        message: "Failed to create Kubernetes client".to_string(),
    })
}
