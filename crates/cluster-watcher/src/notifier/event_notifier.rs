use std::collections::HashMap;
use std::sync::Arc;

use api_types::OperationEvent;
use api_types::PodEventType;
use error_stack::Report;
use error_stack::ResultExt;
use tracing::debug;
use tracing::error;
use tracing::warn;
use uuid::Uuid;

use super::NotifyError;
use super::SessionManager;
use crate::domain::PodEvent;

/// Operation key configured per event type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationKeys(HashMap<PodEventType, String>);

impl OperationKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, event_type: PodEventType, operation_key: impl Into<String>) -> Self {
        self.0.insert(event_type, operation_key.into());
        self
    }

    pub fn get(&self, event_type: PodEventType) -> Option<&str> {
        self.0.get(&event_type).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PodEventType, String)> for OperationKeys {
    fn from_iter<I: IntoIterator<Item = (PodEventType, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub operation_keys: OperationKeys,
    pub source_sub_system: String,
    pub operation_user: String,
}

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No operation key configured for the event type
    Skipped,
    /// Delivered on the first attempt
    Delivered,
    /// Delivered on the retry with a refreshed session
    Retried,
    /// Both attempts failed; the event is gone
    Dropped,
}

/// Delivers qualifying pod events to the platform.
pub struct EventNotifier {
    sessions: Arc<SessionManager>,
    config: NotifierConfig,
}

impl EventNotifier {
    pub fn new(sessions: Arc<SessionManager>, config: NotifierConfig) -> Self {
        Self { sessions, config }
    }

    /// Delivers one event, retrying exactly once with a fresh session.
    ///
    /// Failures are logged and never returned; a twice-failed event is dropped.
    #[tracing::instrument(skip_all, fields(cluster_id = %event.cluster_id, event_type = %event.event_type, pod = %event.pod.name))]
    pub async fn notify(&self, event: &PodEvent) -> NotifyOutcome {
        let Some(operation_key) = self.config.operation_keys.get(event.event_type) else {
            debug!("No operation key configured, skipping");
            return NotifyOutcome::Skipped;
        };

        let body = OperationEvent {
            event_seq_no: Uuid::new_v4().simple().to_string(),
            event_type: event.event_type,
            source_sub_system: self.config.source_sub_system.clone(),
            operation_key: operation_key.to_string(),
            operation_data: event.pod.id.clone(),
            operation_user: self.config.operation_user.clone(),
        };

        match self.deliver(&body).await {
            Ok(()) => {
                debug!(event_seq_no = %body.event_seq_no, "Event delivered");
                return NotifyOutcome::Delivered;
            }
            Err(e) => warn!("Event delivery failed, retrying with a fresh session: {e:?}"),
        }

        match self.deliver(&body).await {
            Ok(()) => {
                debug!(event_seq_no = %body.event_seq_no, "Event delivered on retry");
                NotifyOutcome::Retried
            }
            Err(e) => {
                error!(
                    event_seq_no = %body.event_seq_no,
                    "Event delivery failed after retry, dropping event: {e:?}"
                );
                NotifyOutcome::Dropped
            }
        }
    }

    async fn deliver(&self, body: &OperationEvent) -> Result<(), Report<NotifyError>> {
        let session = self.sessions.acquire().await?;
        let sent = self
            .sessions
            .api()
            .send_operation_event(session.token(), body)
            .await;

        if sent.is_err() {
            self.sessions.invalidate(&session).await;
        }
        sent.change_context(NotifyError::Delivery {
            event_type: body.event_type,
            pod_id: body.operation_data.clone(),
        })
    }
}
