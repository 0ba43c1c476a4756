// Path: crates/client/src/error.rs
use baker_types::error::{BakerError, ErrorCode};
use thiserror::Error;

/// Errors raised by the HTTP adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("transport error on {route}: {source}")]
    Transport {
        /// Logical route name.
        route: &'static str,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{route} returned {status}: {body}")]
    Status {
        /// Logical route name.
        route: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("unexpected response from {route}: {reason}")]
    Decode {
        /// Logical route name.
        route: &'static str,
        /// What was wrong.
        reason: String,
    },
    /// A base58check value could not be decoded.
    #[error("invalid base58check value '{0}'")]
    Base58(String),
    /// No RPC endpoint is configured.
    #[error("no RPC endpoint configured")]
    NoEndpoint,
    /// The client could not be built.
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl ErrorCode for ClientError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "CLIENT_TRANSPORT_ERROR",
            Self::Status { .. } => "CLIENT_STATUS_ERROR",
            Self::Decode { .. } => "CLIENT_DECODE_ERROR",
            Self::Base58(_) => "CLIENT_BASE58_ERROR",
            Self::NoEndpoint => "CLIENT_NO_ENDPOINT",
            Self::Setup(_) => "CLIENT_SETUP_ERROR",
        }
    }
}

impl From<ClientError> for BakerError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Base58(_) => BakerError::Encoding(e.to_string()),
            ClientError::Setup(_) => BakerError::Config(e.to_string()),
            _ => BakerError::Rpc(e.to_string()),
        }
    }
}
