//! Flattened verdict record handed to the persistence sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::Severity;
use crate::geo::GeoPoint;
use crate::verdict::{Verdict, VerdictStatus};

/// One row for the `detections` store.
///
/// The schema belongs to the sink; this is the pipeline's side of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub lat: f64,
    pub lng: f64,
    pub active_zone: Option<String>,
    pub violation_type: Option<String>,
    pub severity: Option<Severity>,
    pub status: VerdictStatus,
    pub confidence: f64,
    pub anchor_fingerprint: Option<String>,
    pub img_url: Option<String>,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl DetectionRecord {
    pub fn from_verdict(point: GeoPoint, verdict: &Verdict, violation_type: Option<String>) -> Self {
        let violation = verdict.violation.as_ref();
        Self {
            lat: point.lat,
            lng: point.lng,
            active_zone: violation.map(|v| v.zone.clone()),
            violation_type,
            severity: violation.map(|v| v.severity),
            status: verdict.status,
            confidence: verdict.confidence,
            anchor_fingerprint: verdict.anchor_fingerprint.clone(),
            img_url: verdict.evidence_image_ref.clone(),
            message: verdict.message.clone(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_verdict_flattens_to_empty_violation() {
        let verdict = Verdict::ignored("No Change Detected");
        let rec = DetectionRecord::from_verdict(GeoPoint::new(10.0, 10.0), &verdict, None);
        assert_eq!(rec.status, VerdictStatus::Ignored);
        assert!(rec.active_zone.is_none());
        assert!(rec.severity.is_none());
        assert_eq!(rec.message, "No Change Detected");
    }

    #[test]
    fn record_json_has_flat_fields() {
        let verdict = Verdict::ignored("incomplete scene");
        let rec = DetectionRecord::from_verdict(GeoPoint::new(1.0, 2.0), &verdict, None);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["lat"], 1.0);
        assert_eq!(json["status"], "IGNORED");
    }
}
