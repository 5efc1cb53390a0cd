//! client config

use std::fmt;
use std::time::Duration;

pub const DEFAULT_LOGIN_PATH: &str = "/platform/v1/auth/login";
pub const DEFAULT_EVENT_PATH: &str = "/platform/v1/operation-events";

/// Platform client config.
#[derive(Clone)]
pub struct ClientConfig {
    /// platform base url
    pub base_url: String,
    /// login user
    pub username: String,
    /// login password
    pub password: String,
    /// login endpoint path
    pub login_path: String,
    /// operation event endpoint path
    pub event_path: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// create new client config with default parameters.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: String::new(),
            password: String::new(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            event_path: DEFAULT_EVENT_PATH.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// set login credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// set login and event endpoint paths.
    pub fn with_paths(mut self, login_path: impl Into<String>, event_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self.event_path = event_path.into();
        self
    }

    /// set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_path", &self.login_path)
            .field("event_path", &self.event_path)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
