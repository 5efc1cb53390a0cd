//! Test platform implementing [`PlatformApi`]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use api_types::OperationEvent;
use async_trait::async_trait;
use error_stack::Report;
use platform_client::PlatformError;
use platform_client::PlatformResult;

use super::PlatformApi;

/// Records logins and deliveries; failures can be injected.
#[derive(Default)]
pub struct MockPlatform {
    logins: AtomicUsize,
    fail_logins: AtomicBool,
    failing_sends: AtomicUsize,
    sent: Mutex<Vec<(String, OperationEvent)>>,
    attempts: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` deliveries fail
    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_logins(&self, enabled: bool) {
        self.fail_logins.store(enabled, Ordering::SeqCst);
    }

    /// Number of login calls, failed ones included
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Number of delivery calls, failed ones included
    pub fn send_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successfully delivered events with the token they were sent with
    pub fn delivered(&self) -> Vec<(String, OperationEvent)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn login(&self) -> PlatformResult<String> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_logins.load(Ordering::SeqCst) {
            return Err(Report::new(PlatformError::Rejected {
                message: "login disabled".to_string(),
            }));
        }
        Ok(format!("tok-{n}"))
    }

    async fn send_operation_event(
        &self,
        token: &str,
        event: &OperationEvent,
    ) -> PlatformResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Report::new(PlatformError::Http {
                status: 503,
                message: "unavailable".to_string(),
            }));
        }
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), event.clone()));
        Ok(())
    }
}
