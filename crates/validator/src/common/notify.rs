// Path: crates/validator/src/common/notify.rs
//! Best-effort fan-out of operator notifications.

use crate::metrics::metrics;
use anyhow::{anyhow, Context, Result};
use baker_api::notify::Notifier;
use baker_api::storage::NotifierConfigStore;
use baker_types::error::BakerError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Builds a notifier from its persisted configuration. An empty slice means
/// "never configured".
pub type NotifierFactory =
    Arc<dyn Fn(&[u8]) -> Result<Arc<dyn Notifier>, BakerError> + Send + Sync>;

/// Holds the named notifiers and delivers messages to the enabled ones.
///
/// Constructed by the composition root and shared by `Arc`. Delivery
/// failures are logged and counted, never returned to the sender.
pub struct NotificationService {
    store: Arc<dyn NotifierConfigStore>,
    factories: BTreeMap<String, NotifierFactory>,
    notifiers: RwLock<BTreeMap<String, Arc<dyn Notifier>>>,
}

impl NotificationService {
    /// A service with no notifiers.
    pub fn new(store: Arc<dyn NotifierConfigStore>) -> Self {
        Self {
            store,
            factories: BTreeMap::new(),
            notifiers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers a configurable notifier kind and builds it from the stored
    /// configuration. A stored configuration that no longer parses is logged
    /// and leaves the notifier out until it is reconfigured.
    pub fn with_factory(mut self, name: &str, factory: NotifierFactory) -> Result<Self> {
        let raw = self
            .store
            .notifier_config(name)
            .with_context(|| format!("loading configuration of notifier '{name}'"))?
            .unwrap_or_default();
        match factory(&raw) {
            Ok(notifier) => {
                self.notifiers.get_mut().insert(name.to_string(), notifier);
            }
            Err(e) => {
                tracing::warn!(target: "notify", notifier = name, error = %e, "ignoring unusable notifier configuration");
            }
        }
        self.factories.insert(name.to_string(), factory);
        Ok(self)
    }

    /// Adds a ready-made notifier that cannot be reconfigured.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers
            .get_mut()
            .insert(notifier.name().to_string(), notifier);
        self
    }

    /// Delivers `message` to every enabled notifier.
    pub async fn send(&self, message: &str) {
        let targets: Vec<Arc<dyn Notifier>> = self.notifiers.read().await.values().cloned().collect();
        for notifier in targets {
            if !notifier.is_enabled() {
                tracing::debug!(target: "notify", notifier = notifier.name(), "notifier disabled, skipping");
                metrics().inc_notifications(notifier.name(), "skipped");
                continue;
            }
            match notifier.send(message).await {
                Ok(()) => metrics().inc_notifications(notifier.name(), "sent"),
                Err(e) => {
                    tracing::warn!(target: "notify", notifier = notifier.name(), error = %e, "notification failed");
                    metrics().inc_notifications(notifier.name(), "failed");
                }
            }
        }
    }

    /// Delivers a test message through `name`, enabled or not, and reports
    /// the outcome.
    pub async fn test_send(&self, name: &str) -> Result<()> {
        let notifier = self
            .notifiers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("unknown notifier '{name}'"))?;
        notifier
            .send("Test message from bakerd")
            .await
            .with_context(|| format!("test delivery through '{name}'"))
    }

    /// Rebuilds the notifier `name` from `raw` and, when `save` is set,
    /// persists the configuration. Nothing changes if `raw` is rejected.
    pub async fn configure(&self, name: &str, raw: &[u8], save: bool) -> Result<()> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("unknown notifier '{name}'"))?;
        let notifier = factory(raw).with_context(|| format!("configuring notifier '{name}'"))?;
        if save {
            self.store
                .save_notifier_config(name, raw)
                .with_context(|| format!("saving configuration of notifier '{name}'"))?;
        }
        self.notifiers.write().await.insert(name.to_string(), notifier);
        tracing::info!(target: "notify", notifier = name, saved = save, "notifier configured");
        Ok(())
    }

    /// Persisted configuration of every configurable notifier, as JSON.
    pub fn config(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let mut out = BTreeMap::new();
        for name in self.factories.keys() {
            let value = match self.store.notifier_config(name)? {
                Some(raw) if !raw.is_empty() => serde_json::from_slice(&raw)
                    .with_context(|| format!("decoding configuration of notifier '{name}'"))?,
                _ => serde_json::Value::Null,
            };
            out.insert(name.clone(), value);
        }
        Ok(out)
    }

    /// Names of the active notifiers.
    pub async fn names(&self) -> Vec<String> {
        self.notifiers.read().await.keys().cloned().collect()
    }
}
