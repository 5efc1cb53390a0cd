use std::sync::Arc;

use anyhow::Result;

use crate::app::services::ApplicationServices;
use crate::app::shutdown::ShutdownCoordinator;
use crate::config::DaemonArgs;
use crate::watch::BackoffConfig;
use crate::watch::ReconcileConfig;
use crate::watch::ReconciliationLoop;
use crate::watch::WorkerContext;

/// Application core structure with explicit dependencies
pub struct Application {
    services: ApplicationServices,
    daemon_args: DaemonArgs,
    shutdown: ShutdownCoordinator,
}

impl Application {
    pub fn new(services: ApplicationServices, daemon_args: DaemonArgs) -> Self {
        Self {
            services,
            daemon_args,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Run the reconciliation loop until a termination signal arrives
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting cluster watcher...");
        let signal_task = self.shutdown.install()?;

        let ctx = Arc::new(WorkerContext {
            streams: self.services.watch_streams.clone(),
            notifier: self.services.notifier.clone(),
            backoff: BackoffConfig::from(&self.daemon_args),
        });
        let reconciler = ReconciliationLoop::new(
            self.services.cluster_store.clone(),
            ctx,
            ReconcileConfig::from(&self.daemon_args),
        );

        // workers that ignore the deadline are abandoned, exit proceeds anyway
        if let Err(e) = reconciler.run(self.shutdown.stop_token()).await {
            tracing::warn!("{e:?}");
        }
        signal_task.abort();

        tracing::info!("Application run completed");
        Ok(())
    }

    /// Gracefully shutdown application
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application...");
        self.shutdown.request_stop();
        tracing::info!("Application shutdown completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::app::ApplicationBuilder;

    #[tokio::test]
    async fn stop_request_ends_run() {
        let mut store = tempfile::NamedTempFile::new().unwrap();
        store.write_all(b"[]").unwrap();
        let args = DaemonArgs::try_parse_from([
            "daemon",
            "--cluster-store",
            store.path().to_str().unwrap(),
            "--platform-url",
            "http://127.0.0.1:9",
            "--platform-username",
            "svc",
            "--platform-password",
            "secret",
        ])
        .unwrap();

        let app = ApplicationBuilder::new(args).build().unwrap();
        app.shutdown_coordinator().request_stop();

        tokio::time::timeout(Duration::from_secs(5), app.run())
            .await
            .expect("run returns after stop")
            .unwrap();
        app.shutdown().await.unwrap();
    }
}
