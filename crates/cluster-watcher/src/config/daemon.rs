use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use api_types::PodEventType;
use clap::Parser;
use platform_client::config::DEFAULT_EVENT_PATH;
use platform_client::config::DEFAULT_LOGIN_PATH;
use platform_client::ClientConfig;

use crate::notifier::NotifierConfig;
use crate::notifier::OperationKeys;
use crate::watch::BackoffConfig;
use crate::watch::ReconcileConfig;

#[derive(Parser, Clone)]
pub struct DaemonArgs {
    #[arg(
        long,
        env = "CLUSTER_STORE_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "YAML or JSON file listing the registered clusters, re-read every tick"
    )]
    pub cluster_store: PathBuf,

    #[arg(
        long,
        help = "Accept self-signed API server certificates of registered clusters",
        default_value_t = true,
        env = "KUBE_ACCEPT_INVALID_CERTS",
        action = clap::ArgAction::Set
    )]
    pub accept_invalid_certs: bool,

    #[arg(long, env = "PLATFORM_URL", help = "Base URL of the orchestration platform")]
    pub platform_url: String,

    #[arg(long, env = "PLATFORM_USERNAME", help = "Platform login user")]
    pub platform_username: String,

    #[arg(
        long,
        env = "PLATFORM_PASSWORD",
        hide_env_values = true,
        help = "Platform login password"
    )]
    pub platform_password: String,

    #[arg(long, env = "PLATFORM_LOGIN_PATH", default_value = DEFAULT_LOGIN_PATH)]
    pub login_path: String,

    #[arg(long, env = "PLATFORM_EVENT_PATH", default_value = DEFAULT_EVENT_PATH)]
    pub event_path: String,

    #[arg(
        long,
        env = "PLATFORM_REQUEST_TIMEOUT_SECS",
        default_value = "10",
        help = "Timeout of a single platform request in seconds"
    )]
    pub request_timeout_secs: u64,

    #[arg(
        long,
        env = "PLATFORM_SESSION_TTL_SECS",
        default_value = "3600",
        help = "Lifetime of a platform session before it is re-authenticated"
    )]
    pub session_ttl_secs: u64,

    #[arg(
        long,
        env = "WATCHER_SOURCE_SUB_SYSTEM",
        default_value = "k8s-watcher",
        help = "sourceSubSystem reported with every operation event"
    )]
    pub source_sub_system: String,

    #[arg(
        long,
        env = "WATCHER_OPERATION_USER",
        default_value = "watcher",
        help = "operationUser reported with every operation event"
    )]
    pub operation_user: String,

    #[arg(
        long,
        env = "WATCHER_OPERATION_KEYS",
        default_value = "{}",
        help = "JSON object mapping ADDED/DELETED to platform operation keys",
        value_parser = parse_operation_keys
    )]
    pub operation_keys: OperationKeys,

    #[arg(
        long,
        env = "WATCHER_TICK_INTERVAL_MS",
        default_value = "1000",
        help = "Reconciliation interval in milliseconds"
    )]
    pub tick_interval_ms: u64,

    #[arg(
        long,
        env = "WATCHER_RECOVERY_DELAY_SECS",
        default_value = "5",
        help = "Pause after a failed reconciliation tick"
    )]
    pub recovery_delay_secs: u64,

    #[arg(
        long,
        env = "WATCHER_SHUTDOWN_TIMEOUT_SECS",
        default_value = "30",
        help = "How long shutdown waits for watch workers to exit"
    )]
    pub shutdown_timeout_secs: u64,

    #[arg(
        long,
        env = "WATCHER_MAX_WORKERS",
        default_value = "20",
        help = "Maximum number of concurrently running cluster watches"
    )]
    pub max_workers: usize,

    #[arg(
        long,
        env = "WATCHER_BACKOFF_INITIAL_MS",
        default_value = "500",
        help = "First reconnect delay after a watch failure in milliseconds"
    )]
    pub backoff_initial_ms: u64,

    #[arg(
        long,
        env = "WATCHER_BACKOFF_MAX_SECS",
        default_value = "60",
        help = "Upper bound of the reconnect delay in seconds"
    )]
    pub backoff_max_secs: u64,
}

/// Parse the operation key JSON object, e.g. `{"ADDED": "pod-online"}`
fn parse_operation_keys(s: &str) -> Result<OperationKeys, String> {
    let raw: HashMap<String, String> = serde_json::from_str(s)
        .map_err(|e| format!("Failed to parse operation keys JSON: {e}"))?;
    raw.into_iter()
        .map(|(event_type, key)| Ok((event_type.parse::<PodEventType>()?, key)))
        .collect()
}

impl From<&DaemonArgs> for ReconcileConfig {
    fn from(args: &DaemonArgs) -> Self {
        Self {
            tick_interval: Duration::from_millis(args.tick_interval_ms),
            recovery_delay: Duration::from_secs(args.recovery_delay_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            max_workers: args.max_workers,
        }
    }
}

impl From<&DaemonArgs> for BackoffConfig {
    fn from(args: &DaemonArgs) -> Self {
        Self {
            initial: Duration::from_millis(args.backoff_initial_ms),
            max: Duration::from_secs(args.backoff_max_secs),
        }
    }
}

impl From<&DaemonArgs> for NotifierConfig {
    fn from(args: &DaemonArgs) -> Self {
        Self {
            operation_keys: args.operation_keys.clone(),
            source_sub_system: args.source_sub_system.clone(),
            operation_user: args.operation_user.clone(),
        }
    }
}

impl From<&DaemonArgs> for ClientConfig {
    fn from(args: &DaemonArgs) -> Self {
        ClientConfig::new(args.platform_url.clone())
            .with_credentials(args.platform_username.clone(), args.platform_password.clone())
            .with_paths(args.login_path.clone(), args.event_path.clone())
            .with_request_timeout(Duration::from_secs(args.request_timeout_secs))
    }
}
