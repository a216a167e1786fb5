//! Illegal-mining detection from combined SAR and NDVI signatures.
//!
//! SAR picks up surface disturbance (exposed rock, machinery, flooded pits);
//! NDVI confirms that the vegetation has been cleared.

use serde::Serialize;
use terrasight_core::{Detection, Severity};
use tracing::debug;

use crate::rules::{OrderedRule, first_match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MiningKind {
    OpenPit,
    Quarry,
    SandMining,
    SuspectedExcavation,
    NoMining,
}

impl MiningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPit => "OPEN_PIT",
            Self::Quarry => "QUARRY",
            Self::SandMining => "SAND_MINING",
            Self::SuspectedExcavation => "SUSPECTED_EXCAVATION",
            Self::NoMining => "NO_MINING",
        }
    }
}

/// Boolean signal derived from one reading. Listed in audit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MiningIndicator {
    /// Backscatter above -5 dB.
    MetalMachineryDetected,
    /// Backscatter above -8 dB.
    ExposedRockSurface,
    /// Backscatter below -18 dB.
    WaterFilledPit,
    /// NDVI below 0.1.
    BarrenLand,
    /// NDVI below 0.2.
    VegetationCleared,
}

impl MiningIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetalMachineryDetected => "METAL_MACHINERY_DETECTED",
            Self::ExposedRockSurface => "EXPOSED_ROCK_SURFACE",
            Self::WaterFilledPit => "WATER_FILLED_PIT",
            Self::BarrenLand => "BARREN_LAND",
            Self::VegetationCleared => "VEGETATION_CLEARED",
        }
    }
}

/// The signature the rules are evaluated against.
pub struct MiningSignature {
    pub ndvi: f64,
    pub very_high_backscatter: bool,
    pub high_backscatter: bool,
    pub water_pit: bool,
    pub very_low_vegetation: bool,
    pub low_vegetation: bool,
}

impl MiningSignature {
    pub fn new(backscatter_db: f64, ndvi: f64) -> Self {
        Self {
            ndvi,
            very_high_backscatter: backscatter_db > -5.0,
            high_backscatter: backscatter_db > -8.0,
            water_pit: backscatter_db < -18.0,
            very_low_vegetation: ndvi < 0.1,
            low_vegetation: ndvi < 0.2,
        }
    }

    pub fn indicators(&self) -> Vec<MiningIndicator> {
        [
            (self.very_high_backscatter, MiningIndicator::MetalMachineryDetected),
            (self.high_backscatter, MiningIndicator::ExposedRockSurface),
            (self.water_pit, MiningIndicator::WaterFilledPit),
            (self.very_low_vegetation, MiningIndicator::BarrenLand),
            (self.low_vegetation, MiningIndicator::VegetationCleared),
        ]
        .into_iter()
        .filter_map(|(fired, indicator)| fired.then_some(indicator))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub kind: MiningKind,
    pub severity: Severity,
    pub confidence: f64,
}

fn heavy_machinery_on_barren_land(s: &MiningSignature) -> bool {
    s.very_high_backscatter && s.very_low_vegetation
}

fn exposed_surface_cleared(s: &MiningSignature) -> bool {
    s.high_backscatter && s.low_vegetation
}

fn flooded_pit_cleared(s: &MiningSignature) -> bool {
    s.water_pit && s.low_vegetation
}

fn disturbed_sparse_cover(s: &MiningSignature) -> bool {
    (s.high_backscatter || s.water_pit) && s.ndvi < 0.3
}

/// Evaluated top to bottom; first match wins. No match means no mining.
pub const RULES: &[OrderedRule<MiningSignature, Outcome>] = &[
    OrderedRule {
        name: "heavy_machinery_on_barren_land",
        when: heavy_machinery_on_barren_land,
        then: Outcome {
            kind: MiningKind::OpenPit,
            severity: Severity::Critical,
            confidence: 0.96,
        },
    },
    OrderedRule {
        name: "exposed_surface_cleared",
        when: exposed_surface_cleared,
        then: Outcome {
            kind: MiningKind::Quarry,
            severity: Severity::Warning,
            confidence: 0.88,
        },
    },
    OrderedRule {
        name: "flooded_pit_cleared",
        when: flooded_pit_cleared,
        then: Outcome {
            kind: MiningKind::SandMining,
            severity: Severity::Warning,
            confidence: 0.82,
        },
    },
    OrderedRule {
        name: "disturbed_sparse_cover",
        when: disturbed_sparse_cover,
        then: Outcome {
            kind: MiningKind::SuspectedExcavation,
            severity: Severity::Info,
            confidence: 0.70,
        },
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningReport {
    pub is_mining: bool,
    pub backscatter_db: f64,
    pub ndvi: f64,
    pub kind: MiningKind,
    pub severity: Severity,
    pub confidence: f64,
    pub indicators: Vec<MiningIndicator>,
}

impl MiningReport {
    pub fn detection(&self, evidence_image_ref: Option<&str>) -> Detection {
        if self.is_mining {
            Detection::Positive {
                subtype: self.kind.as_str().to_string(),
                severity: self.severity,
                confidence: self.confidence,
                evidence_image_ref: evidence_image_ref.map(str::to_string),
                indicators: self.indicators.iter().map(|i| i.as_str().to_string()).collect(),
            }
        } else {
            Detection::Negative {
                subtype: None,
                confidence: self.confidence,
            }
        }
    }
}

/// Classify a SAR/NDVI pair.
pub fn detect_illegal_mining(backscatter_db: f64, ndvi: f64) -> MiningReport {
    let signature = MiningSignature::new(backscatter_db, ndvi);
    let indicators = signature.indicators();

    let report = match first_match(RULES, &signature) {
        Some(rule) => MiningReport {
            is_mining: true,
            backscatter_db,
            ndvi,
            kind: rule.then.kind,
            severity: rule.then.severity,
            confidence: rule.then.confidence,
            indicators,
        },
        None => MiningReport {
            is_mining: false,
            backscatter_db,
            ndvi,
            kind: MiningKind::NoMining,
            severity: Severity::Info,
            confidence: 0.5,
            indicators,
        },
    };

    debug!(
        backscatter_db,
        ndvi,
        kind = report.kind.as_str(),
        indicators = report.indicators.len(),
        "mining signature assessed"
    );
    report
}
