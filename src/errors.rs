//! Error types for the Asanpardakht gateway adapter.
//!
//! Transport-level failures and provider-reported statuses are kept in
//! separate variants so a connection error can never be mistaken for an
//! HTTP status code.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The HTTP exchange itself failed (DNS, TLS, connect, read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-200 status.
    #[error("gateway returned status {code}: {}", status_message(*.code))]
    Provider {
        /// HTTP status reported by the provider.
        code: u16,
    },

    /// The provider's response body could not be decoded.
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A callback or endpoint URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A flow step ran before the reference id it needs existed.
    #[error("no reference id: {0}")]
    MissingReference(&'static str),

    /// A required field was absent from the provider's response.
    #[error("missing field in gateway response: {0}")]
    MissingField(&'static str),

    /// The transaction store rejected a lifecycle transition.
    #[error("transaction store error: {0}")]
    Sink(String),
}

impl GatewayError {
    /// Shorthand for a provider-status failure.
    pub fn provider(code: u16) -> Self {
        GatewayError::Provider { code }
    }

    /// The provider status code, if this is a provider-reported failure.
    pub fn provider_code(&self) -> Option<u16> {
        match self {
            GatewayError::Provider { code } => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Human-readable diagnostic for a provider status code.
///
/// The table follows the statuses the IPG REST service documents; it is
/// used for log events and error display, never for control flow.
pub fn status_message(code: u16) -> &'static str {
    match code {
        200 => "ok",
        400 => "bad request, missing or malformed parameters",
        401 => "authentication failed, check the Usr and Pwd headers",
        471 => "merchant identity could not be verified",
        472 => "no transaction found for the given invoice",
        473 => "transaction has already been verified",
        474 => "transaction has already been settled",
        475 => "transaction has already been reversed",
        476 => "transaction is not in a verifiable state",
        477 => "settlement window has passed",
        478 => "transaction was cancelled by the payer",
        479 => "invalid amount for this merchant configuration",
        571 => "internal gateway error",
        572 => "gateway temporarily unavailable",
        _ => "unrecognized gateway status",
    }
}
