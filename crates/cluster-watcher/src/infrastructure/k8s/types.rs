use core::error::Error;

/// Errors that can occur while watching a cluster's pods.
///
/// All of them are transient for the owning watch worker.
#[derive(Debug, derive_more::Display)]
pub enum WatchError {
    #[display("Failed to connect to cluster {cluster_id}: {message}")]
    ConnectionFailed { cluster_id: String, message: String },
    #[display("Pod watch failed for cluster {cluster_id}: {message}")]
    WatchFailed { cluster_id: String, message: String },
    #[display("Watch API error for cluster {cluster_id}: {code} {message}")]
    ApiError {
        cluster_id: String,
        code: u16,
        message: String,
    },
}

impl WatchError {
    /// The resume version is too old (410 Gone) and the watch must restart from
    /// a fresh listing.
    pub fn is_expired(&self) -> bool {
        matches!(self, WatchError::ApiError { code: 410, .. })
    }
}

impl Error for WatchError {}
