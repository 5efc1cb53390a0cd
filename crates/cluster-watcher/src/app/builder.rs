use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use platform_client::ClientConfig;
use platform_client::PlatformClient;

use crate::app::Application;
use crate::app::ApplicationServices;
use crate::config::DaemonArgs;
use crate::infrastructure::k8s::KubeWatchStreamFactory;
use crate::infrastructure::FileClusterStore;
use crate::notifier::EventNotifier;
use crate::notifier::NotifierConfig;
use crate::notifier::SessionManager;

/// Application builder
pub struct ApplicationBuilder {
    daemon_args: DaemonArgs,
}

impl ApplicationBuilder {
    pub fn new(daemon_args: DaemonArgs) -> Self {
        Self { daemon_args }
    }

    /// Build complete application
    pub fn build(self) -> Result<Application> {
        tracing::info!("Building application components...");
        let args = &self.daemon_args;

        let client_config = ClientConfig::from(args);
        tracing::info!(
            platform_url = %client_config.base_url,
            "Configuring platform client"
        );
        let client = PlatformClient::new(client_config)
            .map_err(|e| anyhow::anyhow!("Failed to create platform client: {e:?}"))?;
        let sessions = Arc::new(SessionManager::new(
            Arc::new(client),
            Duration::from_secs(args.session_ttl_secs),
        ));

        let notifier_config = NotifierConfig::from(args);
        if notifier_config.operation_keys.is_empty() {
            tracing::warn!("No operation keys configured, pod events will not be delivered");
        }

        let services = ApplicationServices {
            cluster_store: Arc::new(FileClusterStore::new(args.cluster_store.clone())),
            watch_streams: Arc::new(KubeWatchStreamFactory::new(args.accept_invalid_certs)),
            notifier: Arc::new(EventNotifier::new(sessions, notifier_config)),
        };

        Ok(Application::new(services, self.daemon_args))
    }
}
