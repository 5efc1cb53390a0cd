//! Async HTTP client for the orchestration platform.

use api_types::LoginData;
use api_types::LoginRequest;
use api_types::OperationEvent;
use api_types::PlatformResponse;
use error_stack::Report;
use error_stack::ResultExt;
use reqwest::Client;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::error::PlatformError;
use crate::error::PlatformResult;
use crate::ClientConfig;

/// Platform client: login plus operation event delivery.
///
/// The client itself holds no session; callers pass the bearer token obtained from
/// [`PlatformClient::login`] to every authenticated call.
pub struct PlatformClient {
    config: ClientConfig,
    http: Client,
    login_url: Url,
    event_url: Url,
}

impl PlatformClient {
    /// create client
    pub fn new(config: ClientConfig) -> PlatformResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .change_context(PlatformError::Configuration {
                message: "Failed to create HTTP client".into(),
            })?;

        let login_url = endpoint_url(&config.base_url, &config.login_path)?;
        let event_url = endpoint_url(&config.base_url, &config.event_path)?;

        info!(base_url = %config.base_url, "Platform client created");

        Ok(Self {
            config,
            http,
            login_url,
            event_url,
        })
    }

    /// Authenticate and return a bearer token.
    pub async fn login(&self) -> PlatformResult<String> {
        let request = LoginRequest {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        };

        let response = self
            .http
            .post(self.login_url.clone())
            .json(&request)
            .send()
            .await
            .change_context(PlatformError::Network {
                message: "Failed to send login request".into(),
            })?;

        let envelope: PlatformResponse<LoginData> = read_envelope(response).await?;
        if !envelope.success {
            return Err(Report::new(PlatformError::Rejected {
                message: envelope.message,
            })
            .attach_printable("login"));
        }

        let data = envelope.data.ok_or_else(|| {
            Report::new(PlatformError::Serialization {
                message: "login response carries no token".into(),
            })
        })?;

        debug!(username = %self.config.username, "Platform login succeeded");
        Ok(data.token)
    }

    /// Deliver one operation event with the given session token.
    pub async fn send_operation_event(
        &self,
        token: &str,
        event: &OperationEvent,
    ) -> PlatformResult<()> {
        let response = self
            .http
            .post(self.event_url.clone())
            .bearer_auth(token)
            .json(event)
            .send()
            .await
            .change_context(PlatformError::Network {
                message: "Failed to send operation event".into(),
            })?;

        let envelope: PlatformResponse<serde_json::Value> = read_envelope(response).await?;
        if !envelope.success {
            return Err(Report::new(PlatformError::Rejected {
                message: envelope.message,
            })
            .attach_printable(format!("event_seq_no: {}", event.event_seq_no)));
        }

        Ok(())
    }
}

fn endpoint_url(base_url: &str, path: &str) -> PlatformResult<Url> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).change_context(PlatformError::Configuration {
        message: format!("Invalid endpoint URL `{joined}`"),
    })
}

async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> PlatformResult<PlatformResponse<T>> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(Report::new(PlatformError::Http {
            status: status.as_u16(),
            message,
        }));
    }

    response
        .json::<PlatformResponse<T>>()
        .await
        .change_context(PlatformError::Serialization {
            message: "Failed to decode platform response".into(),
        })
}
