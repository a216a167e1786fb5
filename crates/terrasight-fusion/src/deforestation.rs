//! Vegetation-loss detection from optical NDVI.
//!
//! NDVI scale, for orientation:
//!
//! - `-1.0..0.0` water, barren, urban
//! - `0.0..0.2` sparse vegetation or soil
//! - `0.2..0.5` moderate vegetation
//! - `0.5..1.0` dense forest
//!
//! Loss is measured relative to a baseline NDVI. When the caller has no
//! history for the point, a healthy-forest baseline of 0.65 is assumed.

use serde::Serialize;
use terrasight_core::{Detection, Severity};
use tracing::debug;

use crate::rules::{OrderedRule, first_match};

/// Baseline NDVI assumed when no historical value is available.
pub const DEFAULT_BASELINE_NDVI: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeforestationKind {
    LandClearing,
    Deforestation,
    SeasonalChange,
    NoChange,
}

impl DeforestationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LandClearing => "LAND_CLEARING",
            Self::Deforestation => "DEFORESTATION",
            Self::SeasonalChange => "SEASONAL_CHANGE",
            Self::NoChange => "NO_CHANGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub positive: bool,
    pub kind: DeforestationKind,
    pub severity: Severity,
    pub confidence: f64,
}

/// Inputs the rules look at.
pub struct VegetationChange {
    pub current_ndvi: f64,
    pub loss_percent: f64,
}

fn massive_loss(c: &VegetationChange) -> bool {
    c.loss_percent >= 50.0
}

fn significant_loss(c: &VegetationChange) -> bool {
    c.loss_percent >= 25.0
}

fn moderate_loss_sparse_cover(c: &VegetationChange) -> bool {
    c.loss_percent >= 10.0 && c.current_ndvi < 0.30
}

fn moderate_loss(c: &VegetationChange) -> bool {
    c.loss_percent >= 10.0
}

/// Evaluated top to bottom; first match wins. No match means `NO_CHANGE`.
pub const RULES: &[OrderedRule<VegetationChange, Outcome>] = &[
    OrderedRule {
        name: "massive_loss",
        when: massive_loss,
        then: Outcome {
            positive: true,
            kind: DeforestationKind::LandClearing,
            severity: Severity::Critical,
            confidence: 0.98,
        },
    },
    OrderedRule {
        name: "significant_loss",
        when: significant_loss,
        then: Outcome {
            positive: true,
            kind: DeforestationKind::Deforestation,
            severity: Severity::Warning,
            confidence: 0.92,
        },
    },
    OrderedRule {
        name: "moderate_loss_sparse_cover",
        when: moderate_loss_sparse_cover,
        then: Outcome {
            positive: true,
            kind: DeforestationKind::Deforestation,
            severity: Severity::Info,
            confidence: 0.75,
        },
    },
    OrderedRule {
        name: "moderate_loss",
        when: moderate_loss,
        then: Outcome {
            positive: false,
            kind: DeforestationKind::SeasonalChange,
            severity: Severity::Info,
            confidence: 0.60,
        },
    },
];

const NO_CHANGE: Outcome = Outcome {
    positive: false,
    kind: DeforestationKind::NoChange,
    severity: Severity::Info,
    confidence: 0.5,
};

/// Result of a deforestation assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeforestationReport {
    pub is_deforestation: bool,
    pub current_ndvi: f64,
    pub baseline_ndvi: f64,
    /// Never negative; vegetation gain reports 0.
    pub loss_percent: f64,
    pub kind: DeforestationKind,
    pub severity: Severity,
    pub confidence: f64,
    /// Name of the rule that decided the outcome, if any.
    pub rule: Option<&'static str>,
}

impl DeforestationReport {
    pub fn detection(&self, evidence_image_ref: Option<&str>) -> Detection {
        if self.is_deforestation {
            Detection::Positive {
                subtype: self.kind.as_str().to_string(),
                severity: self.severity,
                confidence: self.confidence,
                evidence_image_ref: evidence_image_ref.map(str::to_string),
                indicators: vec![format!("VEGETATION_LOSS_{:.1}_PCT", self.loss_percent)],
            }
        } else {
            Detection::Negative {
                subtype: Some(self.kind.as_str().to_string()),
                confidence: self.confidence,
            }
        }
    }
}

/// Assess vegetation loss from `current_ndvi` against `baseline_ndvi`.
///
/// A missing, non-finite or non-positive baseline falls back to
/// [`DEFAULT_BASELINE_NDVI`].
pub fn analyze_deforestation(current_ndvi: f64, baseline_ndvi: Option<f64>) -> DeforestationReport {
    let baseline = baseline_ndvi
        .filter(|b| b.is_finite() && *b > 0.0)
        .unwrap_or(DEFAULT_BASELINE_NDVI);

    let loss_percent = ((baseline - current_ndvi) / baseline * 100.0).max(0.0);
    let change = VegetationChange {
        current_ndvi,
        loss_percent,
    };

    let matched = first_match(RULES, &change);
    let outcome = matched.map(|r| r.then).unwrap_or(NO_CHANGE);

    debug!(
        current_ndvi,
        baseline_ndvi = baseline,
        loss_percent,
        kind = outcome.kind.as_str(),
        "deforestation assessed"
    );

    DeforestationReport {
        is_deforestation: outcome.positive,
        current_ndvi,
        baseline_ndvi: baseline,
        loss_percent,
        kind: outcome.kind,
        severity: outcome.severity,
        confidence: outcome.confidence,
        rule: matched.map(|r| r.name),
    }
}
