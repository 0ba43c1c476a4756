// Path: crates/types/src/seal.rs

use crate::error::BakerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two kinds of signed artifacts the daemon produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Producing a block.
    Bake,
    /// Attesting to a block.
    Endorse,
}

impl OperationKind {
    /// Both kinds, in a stable order.
    pub const ALL: [OperationKind; 2] = [OperationKind::Bake, OperationKind::Endorse];

    /// Name of the watermark bucket for this kind.
    pub fn watermark_bucket(self) -> &'static str {
        match self {
            OperationKind::Bake => "bakes",
            OperationKind::Endorse => "endorses",
        }
    }

    /// Name of the nested rights bucket for this kind.
    pub fn rights_bucket(self) -> &'static str {
        match self {
            OperationKind::Bake => "baking",
            OperationKind::Endorse => "endorsing",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Bake => "bake",
            OperationKind::Endorse => "endorse",
        })
    }
}

impl FromStr for OperationKind {
    type Err = BakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bake" | "bakes" => Ok(OperationKind::Bake),
            "endorse" | "endorses" => Ok(OperationKind::Endorse),
            other => Err(BakerError::Config(format!("unknown operation kind '{other}'"))),
        }
    }
}

/// A sealed artifact: the level and the hash that was submitted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealRecord {
    /// Sealed level.
    pub level: u64,
    /// Hash of the submitted artifact.
    pub hash: String,
}

/// What `record_seal` did with a request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealOutcome {
    /// The watermark advanced and the hash was stored.
    Recorded,
    /// The same hash was already sealed at that level.
    Replayed,
    /// The level is at or below the watermark; nothing was written.
    IgnoredBackward {
        /// The watermark that was left untouched.
        watermark: u64,
    },
}

/// Answer of the pre-production gate for a (kind, level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing prevents producing the artifact.
    Proceed,
    /// The level is at or below the sealed watermark.
    AtOrBelowWatermark {
        /// The current watermark.
        watermark: u64,
    },
    /// A submission for this level was started and never sealed or cleared.
    IntentOutstanding,
}

impl GateDecision {
    /// Whether the caller may go ahead.
    pub fn is_proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed)
    }
}

/// Marker written right before an irreversible submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionIntent {
    /// Kind of artifact being submitted.
    pub kind: OperationKind,
    /// Level of the artifact.
    pub level: u64,
    /// Unix time (seconds) at which the intent was recorded.
    pub recorded_at: u64,
}
