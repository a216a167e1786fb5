//! The [`SensorSource`] seam and scene assembly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use terrasight_core::{ChangeWindow, EvidenceImage, FusedScene, GeoPoint, SensorKind, SensorReading};
use tracing::debug;

/// Age of the rolling baseline the default change window compares against.
pub const BASELINE_DAYS: i64 = 30;

/// Nominal co-registration error between Sentinel-1 and Sentinel-2 grids, metres.
const NOMINAL_CO_REGISTRATION_M: f64 = 5.0;

/// Supplies readings for a point. Implementations never fail: they fall back
/// to safe defaults and record the fallback in the reading's provenance.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// One reading of `kind` at `point`, as of `at` (now when `None`).
    async fn fetch_reading(
        &self,
        point: GeoPoint,
        kind: SensorKind,
        at: Option<DateTime<Utc>>,
    ) -> SensorReading;

    /// Optical true-colour evidence image, when one can be obtained.
    async fn fetch_image(&self, point: GeoPoint) -> Option<EvidenceImage>;

    /// Compare current optical NDVI against the reading [`BASELINE_DAYS`] ago.
    ///
    /// When either reading is a fallback the window reports no change.
    async fn change_window(&self, point: GeoPoint) -> ChangeWindow {
        let now = Utc::now();
        let baseline_at = now - Duration::days(BASELINE_DAYS);
        let (current, baseline) = tokio::join!(
            self.fetch_reading(point, SensorKind::OpticalNdvi, Some(now)),
            self.fetch_reading(point, SensorKind::OpticalNdvi, Some(baseline_at)),
        );
        if !current.is_available() || !baseline.is_available() {
            debug!(
                current = %current.source_label,
                baseline = %baseline.source_label,
                "optical reading unavailable, no comparison"
            );
            return ChangeWindow::unchanged(current.value, current.source_label);
        }
        ChangeWindow::between(current.value, baseline.value, current.source_label)
    }
}

/// Assemble the scene for one cycle: OPTICAL, SAR, and the evidence image
/// are fetched jointly.
pub async fn collect_scene(
    source: &dyn SensorSource,
    point: GeoPoint,
    jurisdiction_hint: Option<String>,
) -> FusedScene {
    let at = Utc::now();
    let (optical, sar, image) = tokio::join!(
        source.fetch_reading(point, SensorKind::OpticalNdvi, Some(at)),
        source.fetch_reading(point, SensorKind::SarBackscatter, Some(at)),
        source.fetch_image(point),
    );
    debug!(
        ndvi = optical.value,
        backscatter_db = sar.value,
        image = image.is_some(),
        "scene readings collected"
    );

    let mut readings = BTreeMap::new();
    readings.insert(optical.kind, optical);
    readings.insert(sar.kind, sar);

    FusedScene {
        id: format!("SCENE-{}-{:.4}-{:.4}", at.timestamp_millis(), point.lat, point.lng),
        centroid: point,
        timestamp: at,
        jurisdiction_hint,
        readings,
        alignment_quality: NOMINAL_CO_REGISTRATION_M,
        image,
    }
}
