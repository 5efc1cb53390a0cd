//! HTTP client for the orchestration platform.
//!
//! The platform exposes a login endpoint issuing bearer tokens and an operation
//! event endpoint that triggers downstream workflows. Both answer with a
//! `{success, data, message}` envelope.
//!
//! # Examples
//!
//! ```no_run
//! # use platform_client::{ClientConfig, PlatformClient};
//! # async fn run() -> platform_client::PlatformResult<()> {
//! let config = ClientConfig::new("https://platform.local").with_credentials("svc", "secret");
//! let client = PlatformClient::new(config)?;
//! let token = client.login().await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::PlatformClient;
pub use config::ClientConfig;
pub use error::PlatformError;
pub use error::PlatformResult;
