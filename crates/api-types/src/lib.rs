//! Shared API type definitions
//!
//! This crate contains the data model shared between the cluster watcher and the
//! orchestration platform client: registered cluster records, pod snapshots and the
//! wire format of platform operation events.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// A Kubernetes cluster registered with the platform.
///
/// Identity is `id`. Only `api_server` and `token` decide whether an existing
/// watch connection is still valid for the record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Unique cluster id
    pub id: String,
    /// Human readable cluster name
    #[serde(default)]
    pub name: String,
    /// Kubernetes API server URL
    pub api_server: String,
    /// Bearer token used against the API server
    pub token: String,
    /// Correlation id forwarded with every pod snapshot of this cluster
    #[serde(default)]
    pub correlation_id: String,
    /// Metrics endpoint host
    #[serde(default)]
    pub metric_host: Option<String>,
    /// Metrics endpoint port
    #[serde(default)]
    pub metric_port: Option<u16>,
}

impl ClusterRecord {
    /// Whether both records reach the same API server with the same credential.
    pub fn same_connectivity(&self, other: &ClusterRecord) -> bool {
        self.api_server == other.api_server && self.token == other.token
    }
}

impl fmt::Debug for ClusterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_server", &self.api_server)
            .field("token", &"<redacted>")
            .field("correlation_id", &self.correlation_id)
            .field("metric_host", &self.metric_host)
            .field("metric_port", &self.metric_port)
            .finish()
    }
}

/// Pod lifecycle events forwarded to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PodEventType {
    Added,
    Deleted,
}

impl PodEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodEventType::Added => "ADDED",
            PodEventType::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for PodEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PodEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADDED" => Ok(PodEventType::Added),
            "DELETED" => Ok(PodEventType::Deleted),
            other => Err(format!("unknown pod event type `{other}`")),
        }
    }
}

/// Point-in-time view of a pod, as forwarded to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PodSnapshot {
    /// Pod uid
    pub id: String,
    /// Pod name
    pub name: String,
    /// Pod namespace
    pub namespace: String,
    /// Pod IP, if one was assigned
    pub ip_address: Option<String>,
    /// Node the pod is scheduled on
    pub node_id: Option<String>,
    /// Correlation id of the owning cluster
    pub correlation_id: String,
}

/// Body of `POST /platform/v1/operation-events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEvent {
    pub event_seq_no: String,
    pub event_type: PodEventType,
    pub source_sub_system: String,
    pub operation_key: String,
    pub operation_data: String,
    pub operation_user: String,
}

/// Success/failure envelope returned by every platform endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Payload (present when successful)
    pub data: Option<T>,
    /// Response message
    #[serde(default)]
    pub message: String,
}

/// Credentials sent to the platform login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    /// Bearer token for subsequent requests
    pub token: String,
}
