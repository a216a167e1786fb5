//! Sensor readings and the fused scene the detectors consume.
//!
//! A [`FusedScene`] is built once per analysis cycle by the sensor source
//! and shared read-only by every detector. Readings are sanitised on
//! construction: a non-finite value is replaced by the kind's safe default
//! so NaN never reaches a classifier.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// The two physical measurements a scene carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorKind {
    /// Sentinel-2 optical vegetation index, range [-1, 1].
    OpticalNdvi,
    /// Sentinel-1 radar backscatter in dB, typically [-25, 0].
    SarBackscatter,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpticalNdvi => "OPTICAL_NDVI",
            Self::SarBackscatter => "SAR_BACKSCATTER",
        }
    }

    /// Value substituted when a measurement is missing or non-finite.
    ///
    /// Both defaults sit on the "no mining" side of every absolute threshold.
    /// Relative comparisons must skip fallback readings; see
    /// [`SensorReading::is_available`].
    pub fn safe_default(&self) -> f64 {
        match self {
            Self::OpticalNdvi => 0.3,
            Self::SarBackscatter => -15.0,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement at a point and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    /// Provenance, e.g. `SENTINEL-2 L2A (Live Stats)` or a simulation label.
    pub source_label: String,
    pub confidence: f64,
}

impl SensorReading {
    pub fn new(
        kind: SensorKind,
        value: f64,
        timestamp: DateTime<Utc>,
        source_label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let value = if value.is_finite() {
            value
        } else {
            kind.safe_default()
        };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            kind,
            value,
            timestamp,
            source_label: source_label.into(),
            confidence,
        }
    }

    /// A reading carrying the kind's safe default, used when upstream data is unavailable.
    pub fn fallback(kind: SensorKind, timestamp: DateTime<Utc>, source_label: impl Into<String>) -> Self {
        Self::new(kind, kind.safe_default(), timestamp, source_label, 0.0)
    }

    /// False for a fallback: the value is a substitute, not a measurement.
    pub fn is_available(&self) -> bool {
        self.confidence > 0.0
    }
}

/// Optical true-colour image captured alongside the readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceImage {
    /// Content address of the image bytes (`sha256:<hex>`).
    pub reference: String,
    pub content_type: String,
    pub byte_len: usize,
}

/// Comparison of the current optical reading against a rolling baseline.
///
/// The sensor source decides how the baseline is obtained; detectors only
/// read `deviation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeWindow {
    pub current: f64,
    pub baseline: f64,
    /// Relative deviation of `current` from `baseline` (0.1 = 10%).
    pub deviation: f64,
    pub source_label: String,
}

impl ChangeWindow {
    /// Compute the relative deviation between two readings.
    ///
    /// A zero baseline is replaced by 0.1 to keep the ratio finite.
    pub fn between(current: f64, baseline: f64, source_label: impl Into<String>) -> Self {
        let denominator = if baseline == 0.0 { 0.1 } else { baseline };
        let deviation = ((current - baseline) / denominator).abs();
        Self {
            current,
            baseline,
            deviation: if deviation.is_finite() { deviation } else { 0.0 },
            source_label: source_label.into(),
        }
    }

    /// A window reporting no change, used when no comparison could be made.
    pub fn unchanged(value: f64, source_label: impl Into<String>) -> Self {
        Self {
            current: value,
            baseline: value,
            deviation: 0.0,
            source_label: source_label.into(),
        }
    }
}

/// Co-located readings for one analysis cycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedScene {
    pub id: String,
    pub centroid: GeoPoint,
    pub timestamp: DateTime<Utc>,
    /// Jurisdiction code narrowing rule lookup, e.g. `DELHI`.
    pub jurisdiction_hint: Option<String>,
    pub readings: BTreeMap<SensorKind, SensorReading>,
    /// Estimated co-registration error in metres. Informational only.
    pub alignment_quality: f64,
    pub image: Option<EvidenceImage>,
}

impl FusedScene {
    pub fn reading(&self, kind: SensorKind) -> Option<&SensorReading> {
        self.readings.get(&kind)
    }

    pub fn optical(&self) -> Option<&SensorReading> {
        self.reading(SensorKind::OpticalNdvi)
    }

    pub fn sar(&self) -> Option<&SensorReading> {
        self.reading(SensorKind::SarBackscatter)
    }

    /// Both required readings are present.
    pub fn is_complete(&self) -> bool {
        self.optical().is_some() && self.sar().is_some()
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image.as_ref().map(|img| img.reference.as_str())
    }
}
