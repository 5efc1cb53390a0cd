//! Error types for the platform client.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, Report<PlatformError>>;

/// Errors that can occur while talking to the orchestration platform.
#[derive(Debug, Display)]
pub enum PlatformError {
    /// Network connectivity issues
    #[display("Network error: {message}")]
    Network { message: String },

    /// Non-success HTTP status
    #[display("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The platform answered with `success: false`
    #[display("Request rejected by platform: {message}")]
    Rejected { message: String },

    /// Serialization/deserialization errors
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error for PlatformError {}
