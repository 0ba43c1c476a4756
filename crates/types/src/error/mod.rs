// Path: crates/types/src/error/mod.rs
//! Core error types for the baker daemon.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors surfaced by the daemon's collaborators (RPC, signer, notifiers) and
/// by configuration handling.
#[derive(Debug, Error)]
pub enum BakerError {
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The requested network is not supported.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    /// The persisted signer type does not map to a known backend.
    #[error("Unknown signer type: {0}")]
    UnknownSignerType(u64),
    /// No signer backend is registered for the selected type.
    #[error("No signer backend available for {0}")]
    SignerUnavailable(String),
    /// The signer backend refused or failed to sign.
    #[error("Signer error: {0}")]
    Signer(String),
    /// The chain RPC returned an error or an unexpected payload.
    #[error("RPC error: {0}")]
    Rpc(String),
    /// Data could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// A notifier failed to deliver a message.
    #[error("Notification error: {0}")]
    Notification(String),
}

impl ErrorCode for BakerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "BAKER_CONFIG_ERROR",
            Self::UnknownNetwork(_) => "BAKER_UNKNOWN_NETWORK",
            Self::UnknownSignerType(_) => "BAKER_UNKNOWN_SIGNER_TYPE",
            Self::SignerUnavailable(_) => "BAKER_SIGNER_UNAVAILABLE",
            Self::Signer(_) => "BAKER_SIGNER_ERROR",
            Self::Rpc(_) => "BAKER_RPC_ERROR",
            Self::Encoding(_) => "BAKER_ENCODING_ERROR",
            Self::Notification(_) => "BAKER_NOTIFICATION_ERROR",
        }
    }
}
