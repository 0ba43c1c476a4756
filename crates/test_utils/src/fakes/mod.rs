//! In-memory collaborators: a scripted chain node, a recording signer and a
//! recording notifier.

use async_trait::async_trait;
use baker_api::chain::{BlockTemplate, ChainRpc, DelegateStatus};
use baker_api::notify::Notifier;
use baker_api::signer::{Signer, SigningDomain};
use baker_types::error::BakerError;
use baker_types::{Block, RightEntry, SignerType};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted state of [`FakeChainRpc`].
#[derive(Debug, Clone)]
pub struct FakeChainState {
    pub healthy: bool,
    pub head: Block,
    pub delegate: DelegateStatus,
    pub baking: BTreeMap<u64, Vec<RightEntry>>,
    pub endorsing: BTreeMap<u64, Vec<RightEntry>>,
    pub inject_delay: Option<Duration>,
    pub fail_injections: bool,
}

impl Default for FakeChainState {
    fn default() -> Self {
        Self {
            healthy: true,
            head: Block::default(),
            delegate: DelegateStatus {
                registered: true,
                deactivated: false,
            },
            baking: BTreeMap::new(),
            endorsing: BTreeMap::new(),
            inject_delay: None,
            fail_injections: false,
        }
    }
}

/// A chain node answering from scripted state and recording what was injected.
///
/// Forged bytes are readable strings (`endorsement:<level>`,
/// `block:<level>:<priority>:<commitment>` and `reveal:<level>`) and
/// injection hashes are derived from them, so replays yield the same hash.
#[derive(Debug, Default)]
pub struct FakeChainRpc {
    state: Mutex<FakeChainState>,
    injected_operations: Mutex<Vec<String>>,
    injected_blocks: Mutex<Vec<String>>,
    templates: Mutex<Vec<BlockTemplate>>,
    rights_requests: Mutex<Vec<(&'static str, u64)>>,
    inject_calls: AtomicUsize,
}

impl FakeChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates the scripted state.
    pub fn update(&self, f: impl FnOnce(&mut FakeChainState)) {
        f(&mut lock(&self.state));
    }

    pub fn with_baking_rights(self, cycle: u64, rights: Vec<RightEntry>) -> Self {
        self.update(|s| {
            s.baking.insert(cycle, rights);
        });
        self
    }

    pub fn with_endorsing_rights(self, cycle: u64, rights: Vec<RightEntry>) -> Self {
        self.update(|s| {
            s.endorsing.insert(cycle, rights);
        });
        self
    }

    /// Hashes returned by `inject_operation`, in order.
    pub fn injected_operations(&self) -> Vec<String> {
        lock(&self.injected_operations).clone()
    }

    /// Hashes returned by `inject_block`, in order.
    pub fn injected_blocks(&self) -> Vec<String> {
        lock(&self.injected_blocks).clone()
    }

    /// Templates passed to `forge_block`.
    pub fn block_templates(&self) -> Vec<BlockTemplate> {
        lock(&self.templates).clone()
    }

    /// `(kind, cycle)` of every rights request.
    pub fn rights_requests(&self) -> Vec<(&'static str, u64)> {
        lock(&self.rights_requests).clone()
    }

    /// Injection calls started, including ones still in flight.
    pub fn inject_calls(&self) -> usize {
        self.inject_calls.load(Ordering::SeqCst)
    }

    async fn before_injection(&self) -> Result<(), BakerError> {
        self.inject_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, fail) = {
            let s = lock(&self.state);
            (s.inject_delay, s.fail_injections)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(BakerError::Rpc("injection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn is_healthy(&self) -> bool {
        lock(&self.state).healthy
    }

    async fn head(&self) -> Result<Block, BakerError> {
        Ok(lock(&self.state).head.clone())
    }

    async fn baking_rights(
        &self,
        cycle: u64,
        _pkh: &str,
        max_priority: u32,
    ) -> Result<Vec<RightEntry>, BakerError> {
        lock(&self.rights_requests).push(("baking", cycle));
        let s = lock(&self.state);
        Ok(s.baking
            .get(&cycle)
            .map(|rights| {
                rights
                    .iter()
                    .filter(|r| r.priority.unwrap_or(0) <= max_priority)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn endorsing_rights(&self, cycle: u64, _pkh: &str) -> Result<Vec<RightEntry>, BakerError> {
        lock(&self.rights_requests).push(("endorsing", cycle));
        Ok(lock(&self.state)
            .endorsing
            .get(&cycle)
            .cloned()
            .unwrap_or_default())
    }

    async fn delegate_status(&self, _pkh: &str) -> Result<DelegateStatus, BakerError> {
        let s = lock(&self.state);
        if !s.healthy {
            return Err(BakerError::Rpc("node unreachable".into()));
        }
        Ok(s.delegate)
    }

    async fn forge_endorsement(&self, head: &Block) -> Result<Vec<u8>, BakerError> {
        Ok(format!("endorsement:{}", head.level).into_bytes())
    }

    async fn forge_nonce_revelation(
        &self,
        _head: &Block,
        level: u64,
        _seed: &[u8],
    ) -> Result<Vec<u8>, BakerError> {
        Ok(format!("reveal:{level}").into_bytes())
    }

    async fn forge_block(
        &self,
        _head: &Block,
        template: &BlockTemplate,
    ) -> Result<Vec<u8>, BakerError> {
        lock(&self.templates).push(template.clone());
        Ok(format!(
            "block:{}:{}:{}",
            template.level,
            template.priority,
            template.seed_nonce_hash.is_some()
        )
        .into_bytes())
    }

    async fn inject_operation(&self, forged: &[u8], _signature: &str) -> Result<String, BakerError> {
        self.before_injection().await?;
        let hash = format!("o-{}", String::from_utf8_lossy(forged));
        lock(&self.injected_operations).push(hash.clone());
        Ok(hash)
    }

    async fn inject_block(&self, forged: &[u8], _signature: &str) -> Result<String, BakerError> {
        self.before_injection().await?;
        let hash = format!("B-{}", String::from_utf8_lossy(forged));
        lock(&self.injected_blocks).push(hash.clone());
        Ok(hash)
    }
}

/// A valid-looking ed25519 signature (`edsig...`) over 64 bytes of `7`.
pub fn fake_signature() -> String {
    let payload = [[9u8, 245, 205, 134, 18].as_slice(), &[7u8; 64]].concat();
    bs58::encode(payload).with_check().into_string()
}

/// One call to [`RecordingSigner::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub payload: Vec<u8>,
    pub domain: SigningDomain,
    pub signer_type: SignerType,
}

/// Signs everything with [`fake_signature`] after an optional delay.
#[derive(Debug, Default)]
pub struct RecordingSigner {
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<SignRequest>>,
}

impl RecordingSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent signature take `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn requests(&self) -> Vec<SignRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Signer for RecordingSigner {
    async fn sign(
        &self,
        payload: &[u8],
        domain: SigningDomain,
        signer_type: SignerType,
    ) -> Result<String, BakerError> {
        lock(&self.requests).push(SignRequest {
            payload: payload.to_vec(),
            domain,
            signer_type,
        });
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(fake_signature())
    }
}

/// Collects delivered messages.
#[derive(Debug)]
pub struct RecordingNotifier {
    name: String,
    enabled: bool,
    fail: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            fail: false,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Records messages but reports every delivery as failed.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, message: &str) -> Result<(), BakerError> {
        lock(&self.messages).push(message.to_string());
        if self.fail {
            return Err(BakerError::Notification("delivery failed".into()));
        }
        Ok(())
    }
}
