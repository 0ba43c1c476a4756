// Path: crates/types/src/status.rs

use crate::rights::RightEntry;
use crate::seal::SealRecord;
use serde::{Deserialize, Serialize};

/// Outcome of the readiness gate evaluated on every new head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Readiness {
    /// No head processed yet.
    #[default]
    Starting,
    /// Tasks are dispatched.
    Ready,
    /// No delegate has been configured.
    NoDelegate,
    /// The operator paused the daemon.
    Paused,
    /// The delegate is not registered or is deactivated on chain.
    NotRegistered,
    /// The chain RPC could not be reached.
    Unreachable(String),
}

impl Readiness {
    /// Whether per-block tasks may be dispatched.
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Stable snake_case name, used as a metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Readiness::Starting => "starting",
            Readiness::Ready => "ready",
            Readiness::NoDelegate => "no_delegate",
            Readiness::Paused => "paused",
            Readiness::NotRegistered => "not_registered",
            Readiness::Unreachable(_) => "unreachable",
        }
    }
}

/// Snapshot of what the daemon knows, refreshed on every head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakerStatus {
    /// Level of the last processed head.
    pub head_level: u64,
    /// Cycle of the last processed head.
    pub head_cycle: u64,
    /// Readiness as of the last head.
    pub readiness: Readiness,
    /// Next known baking opportunity.
    pub next_baking: Option<RightEntry>,
    /// Next known endorsing opportunity.
    pub next_endorsing: Option<RightEntry>,
    /// Most recent sealed block.
    pub last_bake: Option<SealRecord>,
    /// Most recent sealed endorsement.
    pub last_endorsement: Option<SealRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_serializes_with_its_detail() {
        let json = serde_json::to_value(Readiness::Unreachable("timeout".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "unreachable", "detail": "timeout" }));
        assert_eq!(Readiness::Unreachable(String::new()).label(), "unreachable");
        assert_eq!(Readiness::NoDelegate.label(), "no_delegate");
        assert!(!Readiness::Paused.is_ready());
    }
}
