//! The orchestrator's final output and the evidence anchor it carries.

use serde::{Deserialize, Serialize};

use crate::detection::{Severity, TerrainAssessment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Verified,
    Ignored,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Ignored => "IGNORED",
        }
    }
}

/// The legal characterisation of a confirmed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub law: String,
    pub section: String,
    pub penalty: String,
    pub severity: Severity,
    pub zone: String,
    pub article: String,
    pub jurisdiction: String,
}

/// How an evidence fingerprint was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnchorMode {
    /// Committed to the ledger; `fingerprint` is the transaction id.
    Ledger { transaction_id: String },
    /// Ledger unavailable or not configured; `fingerprint` is the local digest.
    LocalOnly,
}

/// Tamper-evident record of one piece of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Ledger transaction id when committed, otherwise equal to `digest`.
    pub fingerprint: String,
    /// `0x`-prefixed SHA-256 of `metadata`.
    pub digest: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The exact serialised evidence that was hashed.
    pub metadata: String,
    pub mode: AnchorMode,
}

impl AnchorRecord {
    pub fn is_on_ledger(&self) -> bool {
        matches!(self.mode, AnchorMode::Ledger { .. })
    }
}

/// Outcome of one orchestration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub violation: Option<Violation>,
    pub confidence: f64,
    /// Always present when `status` is `Verified`.
    pub anchor_fingerprint: Option<String>,
    pub message: String,
    pub scene_id: Option<String>,
    pub terrain: Option<TerrainAssessment>,
    pub anchor: Option<AnchorRecord>,
    pub legal_notice: Option<String>,
    pub evidence_image_ref: Option<String>,
}

impl Verdict {
    /// An `Ignored` verdict with the given reason.
    pub fn ignored(message: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Ignored,
            violation: None,
            confidence: 0.0,
            anchor_fingerprint: None,
            message: message.into(),
            scene_id: None,
            terrain: None,
            anchor: None,
            legal_notice: None,
            evidence_image_ref: None,
        }
    }

    /// A `Verified` verdict. The fingerprint is taken from the anchor record.
    pub fn verified(
        violation: Violation,
        confidence: f64,
        anchor: AnchorRecord,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: VerdictStatus::Verified,
            violation: Some(violation),
            confidence,
            anchor_fingerprint: Some(anchor.fingerprint.clone()),
            message: message.into(),
            scene_id: None,
            terrain: None,
            anchor: Some(anchor),
            legal_notice: None,
            evidence_image_ref: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status == VerdictStatus::Verified
    }

    pub fn with_scene(mut self, scene_id: impl Into<String>, terrain: Option<TerrainAssessment>) -> Self {
        self.scene_id = Some(scene_id.into());
        self.terrain = terrain;
        self
    }
}
