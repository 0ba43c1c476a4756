// Path: crates/client/src/webhook.rs
//! Chat-style webhook notifier.

use async_trait::async_trait;
use baker_api::notify::Notifier;
use baker_types::error::BakerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persisted configuration of the webhook notifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Whether messages are delivered.
    #[serde(default)]
    pub enabled: bool,
    /// Target URL receiving `{"text": message}`.
    #[serde(default)]
    pub url: String,
}

/// Posts `{"text": message}` to a configured URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Name used as the configuration key.
    pub const NAME: &'static str = "webhook";

    /// Builds a notifier from its persisted JSON configuration. An empty
    /// configuration yields a disabled notifier.
    pub fn from_config(raw: &[u8], timeout: Duration) -> Result<Self, BakerError> {
        let config = if raw.is_empty() {
            WebhookConfig::default()
        } else {
            serde_json::from_slice(raw)
                .map_err(|e| BakerError::Config(format!("invalid webhook config: {e}")))?
        };
        if config.enabled && config.url.is_empty() {
            return Err(BakerError::Config("webhook enabled without a url".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BakerError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// The active configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn send(&self, message: &str) -> Result<(), BakerError> {
        let resp = self
            .client
            .post(&self.config.url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await
            .map_err(|e| BakerError::Notification(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(BakerError::Notification(format!(
                "webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_disabled() {
        let n = WebhookNotifier::from_config(b"", Duration::from_secs(1)).unwrap();
        assert!(!n.is_enabled());
        assert_eq!(n.name(), "webhook");
    }

    #[test]
    fn enabled_without_url_is_rejected() {
        assert!(WebhookNotifier::from_config(br#"{"enabled":true}"#, Duration::from_secs(1)).is_err());
        let n = WebhookNotifier::from_config(
            br#"{"enabled":true,"url":"http://hook.local/x"}"#,
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(n.is_enabled());
        assert_eq!(n.config().url, "http://hook.local/x");
    }
}
