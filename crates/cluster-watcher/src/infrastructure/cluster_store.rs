use core::error::Error;
use std::path::PathBuf;

use api_types::ClusterRecord;
use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;

/// Errors that can occur while reading the registered cluster set.
#[derive(Debug, derive_more::Display)]
pub enum StoreError {
    #[display("Failed to read cluster store {path}")]
    Read { path: String },
    #[display("Failed to parse cluster store {path}")]
    Parse { path: String },
}

impl Error for StoreError {}

/// Read-only source of the desired cluster set.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Lists every registered cluster in store order.
    async fn list(&self) -> Result<Vec<ClusterRecord>, Report<StoreError>>;
}

/// Cluster store backed by a YAML (or JSON) file, re-read on every call.
///
/// The file holds either a bare list of records or a `clusters:` list.
pub struct FileClusterStore {
    path: PathBuf,
}

impl FileClusterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClusterStore for FileClusterStore {
    async fn list(&self) -> Result<Vec<ClusterRecord>, Report<StoreError>> {
        let path = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .change_context(StoreError::Read { path: path.clone() })?;
        parse_clusters(&content).change_context(StoreError::Parse { path })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoreDocument {
    List(Vec<ClusterRecord>),
    Wrapped { clusters: Vec<ClusterRecord> },
}

/// Parses a cluster store document. An empty document is an empty store.
pub fn parse_clusters(content: &str) -> Result<Vec<ClusterRecord>, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_yaml::from_str::<StoreDocument>(content)? {
        StoreDocument::List(clusters) | StoreDocument::Wrapped { clusters } => clusters,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use similar_asserts::assert_eq;

    use super::*;

    const STORE_YAML: &str = r#"
- id: c1
  name: primary
  api_server: https://10.0.0.1:6443
  token: t1
  correlation_id: corr-1
  metric_host: 10.0.0.1
  metric_port: 9100
- id: c2
  api_server: https://10.0.0.2:6443
  token: t2
"#;

    #[test]
    fn parse_yaml_list() {
        let clusters = parse_clusters(STORE_YAML).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, "c1");
        assert_eq!(clusters[0].metric_port, Some(9100));
        assert_eq!(clusters[1].name, "");
        assert_eq!(clusters[1].metric_host, None);
    }

    #[test]
    fn parse_wrapped_json() {
        let json = r#"{"clusters": [{"id": "c1", "api_server": "https://a", "token": "t1"}]}"#;
        let clusters = parse_clusters(json).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].api_server, "https://a");
    }

    #[test]
    fn parse_empty_document() {
        assert!(parse_clusters("  \n").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_missing_token() {
        assert!(parse_clusters("- id: c1\n  api_server: https://a\n").is_err());
    }

    #[tokio::test]
    async fn file_store_rereads_on_every_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STORE_YAML.as_bytes()).unwrap();
        let store = FileClusterStore::new(file.path());
        assert_eq!(store.list().await.unwrap().len(), 2);

        std::fs::write(file.path(), "[]").unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let store = FileClusterStore::new("/nonexistent/clusters.yaml");
        let err = store.list().await.unwrap_err();
        assert!(matches!(err.current_context(), StoreError::Read { .. }));
    }
}
