// Path: crates/api/src/notify/mod.rs
//! Notification sinks.

use async_trait::async_trait;
use baker_types::error::BakerError;

/// A best-effort message channel (chat webhook, email and so on).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable name, also used as the configuration key.
    fn name(&self) -> &str;

    /// Disabled notifiers are skipped by fan-out.
    fn is_enabled(&self) -> bool;

    /// Delivers one message.
    async fn send(&self, message: &str) -> Result<(), BakerError>;
}
