use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Turns process termination signals into a cooperative stop request.
///
/// The stop token is handed to the reconciliation loop only; workers are
/// stopped through their own tokens.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    stop: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Installs SIGTERM/SIGINT handlers; the first signal requests stop.
    pub fn install(&self) -> Result<JoinHandle<()>> {
        let stop = self.stop.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::signal;
            use tokio::signal::unix::SignalKind;
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;

            Ok(tokio::spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT, initiating graceful shutdown");
                    }
                    _ = stop.cancelled() => return,
                }
                stop.cancel();
            }))
        }
        #[cfg(not(unix))]
        {
            Ok(tokio::spawn(async move {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::error!("Failed to listen for Ctrl+C: {e}");
                            return;
                        }
                        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    }
                    _ = stop.cancelled() => return,
                }
                stop.cancel();
            }))
        }
    }
}
