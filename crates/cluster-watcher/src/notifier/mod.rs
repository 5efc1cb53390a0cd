//! Delivery of qualifying pod events to the orchestration platform.

mod event_notifier;
#[cfg(test)]
pub(crate) mod mock;
mod session;

use core::error::Error;

use api_types::OperationEvent;
use api_types::PodEventType;
use async_trait::async_trait;
use platform_client::PlatformClient;
use platform_client::PlatformResult;

pub use event_notifier::EventNotifier;
pub use event_notifier::NotifierConfig;
pub use event_notifier::NotifyOutcome;
pub use event_notifier::OperationKeys;
pub use session::Session;
pub use session::SessionManager;

/// Errors that can occur while notifying the platform.
#[derive(Debug, derive_more::Display)]
pub enum NotifyError {
    #[display("Failed to authenticate with the platform")]
    Auth,
    #[display("Failed to deliver {event_type} event for pod {pod_id}")]
    Delivery {
        event_type: PodEventType,
        pod_id: String,
    },
}

impl Error for NotifyError {}

/// Platform operations the notifier depends on.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Authenticates and returns a bearer token.
    async fn login(&self) -> PlatformResult<String>;

    /// Sends one operation event using a bearer token.
    async fn send_operation_event(&self, token: &str, event: &OperationEvent)
        -> PlatformResult<()>;
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn login(&self) -> PlatformResult<String> {
        PlatformClient::login(self).await
    }

    async fn send_operation_event(
        &self,
        token: &str,
        event: &OperationEvent,
    ) -> PlatformResult<()> {
        PlatformClient::send_operation_event(self, token, event).await
    }
}
