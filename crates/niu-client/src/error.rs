//! Error types for vendor API operations

use thiserror::Error;

/// Result type alias for vendor API operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur talking to the vendor cloud API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Login failed: rejected credentials, transport error during login,
    /// or a malformed login response. Fatal at setup.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The configured vehicle index does not exist on the account.
    /// Fatal at setup.
    #[error("vehicle index {index} out of range ({count} vehicles on account)")]
    VehicleNotFound { index: usize, count: usize },

    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error (test server setup)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-200 response from the vendor
    #[error("server error HTTP {status}")]
    ServerError { status: u16 },

    /// HTTP 200 carrying a non-zero vendor-internal status field
    #[error("vendor status {0}")]
    VendorStatus(i64),

    /// Response body was not the expected JSON shape
    #[error("failed to parse response: {0}")]
    Parse(String),
}
