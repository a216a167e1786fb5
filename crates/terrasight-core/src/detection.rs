//! Detector outputs shared across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered severity scale. `Info < Warning < High < Critical`.
///
/// Detectors emit `Info`, `Warning` and `Critical`; `High` comes from the
/// jurisdiction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// One level lower, saturating at `Info`.
    pub fn downgrade(self) -> Self {
        match self {
            Self::Critical => Self::High,
            Self::High => Self::Warning,
            Self::Warning | Self::Info => Self::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single change detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Detection {
    Negative {
        /// Informational label, e.g. `SEASONAL_CHANGE`.
        subtype: Option<String>,
        confidence: f64,
    },
    Positive {
        subtype: String,
        severity: Severity,
        confidence: f64,
        evidence_image_ref: Option<String>,
        /// Names of the signals that fired, for audit.
        indicators: Vec<String>,
    },
}

impl Detection {
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive { .. })
    }

    pub fn subtype(&self) -> Option<&str> {
        match self {
            Self::Negative { subtype, .. } => subtype.as_deref(),
            Self::Positive { subtype, .. } => Some(subtype),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Negative { .. } => None,
            Self::Positive { severity, .. } => Some(*severity),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Negative { confidence, .. } | Self::Positive { confidence, .. } => *confidence,
        }
    }
}

/// Coarse material class derived from SAR backscatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerrainClass {
    MetalConcrete,
    DenseUrban,
    VegetationOrSoil,
}

impl TerrainClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetalConcrete => "METAL_CONCRETE",
            Self::DenseUrban => "DENSE_URBAN",
            Self::VegetationOrSoil => "VEGETATION_OR_SOIL",
        }
    }

    pub fn is_man_made(&self) -> bool {
        matches!(self, Self::MetalConcrete | Self::DenseUrban)
    }
}

impl fmt::Display for TerrainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainAssessment {
    pub class: TerrainClass,
    pub confidence: f64,
    pub backscatter_db: f64,
}
