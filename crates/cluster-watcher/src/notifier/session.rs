use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use error_stack::ResultExt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

use super::NotifyError;
use super::PlatformApi;

/// An authenticated platform session.
#[derive(Clone)]
pub struct Session {
    token: String,
    created_at: Instant,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Owns the single cached platform session shared by all watch workers.
///
/// Every read, refresh and invalidation goes through one mutex. Callers only
/// serialize while a (re)authentication is in flight.
pub struct SessionManager {
    api: Arc<dyn PlatformApi>,
    ttl: Duration,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn PlatformApi>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            current: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &dyn PlatformApi {
        self.api.as_ref()
    }

    /// Returns the cached session, logging in first when it is absent or expired.
    pub async fn acquire(&self) -> Result<Session, Report<NotifyError>> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            if !session.is_expired(self.ttl) {
                return Ok(session.clone());
            }
            debug!(ttl_secs = self.ttl.as_secs(), "Platform session expired");
        }

        let token = self.api.login().await.change_context(NotifyError::Auth)?;
        let session = Session {
            token,
            created_at: Instant::now(),
        };
        info!("Authenticated new platform session");
        *current = Some(session.clone());
        Ok(session)
    }

    /// Drops the cached session if it is still the one the caller failed with.
    ///
    /// A session refreshed by another worker in the meantime is kept.
    pub async fn invalidate(&self, failed: &Session) {
        let mut current = self.current.lock().await;
        let is_same = current
            .as_ref()
            .is_some_and(|s| s.token == failed.token && s.created_at == failed.created_at);
        if is_same {
            debug!("Invalidating platform session");
            *current = None;
        }
    }
}
