//! Offline sources: a fixed profile for tests and demos, and a seeded
//! randomised demo that produces a realistic mix of stable and degraded sites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrasight_core::{ChangeWindow, EvidenceImage, GeoPoint, SensorKind, SensorReading};
use tokio::sync::Mutex;
use tracing::debug;

use crate::source::SensorSource;

pub const SIMULATION_LABEL: &str = "SIMULATED SENSOR";
const DEMO_LABEL: &str = "DEMO SIMULATION";
/// Probability that a demo change window shows a significant vegetation drop.
const DEMO_DEGRADATION_RATE: f64 = 0.4;

/// Readings a [`SimulatedSource`] returns for every point.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedProfile {
    pub ndvi: f64,
    pub backscatter_db: f64,
    /// NDVI the change window compares against.
    pub baseline_ndvi: f64,
    pub confidence: f64,
    pub image: Option<EvidenceImage>,
}

impl SimulatedProfile {
    /// Stable, healthy vegetation: no detector fires.
    pub fn stable() -> Self {
        Self {
            ndvi: 0.4,
            backscatter_db: -12.0,
            baseline_ndvi: 0.4,
            confidence: 0.8,
            image: None,
        }
    }

    pub fn new(ndvi: f64, backscatter_db: f64) -> Self {
        Self {
            ndvi,
            backscatter_db,
            baseline_ndvi: ndvi,
            ..Self::stable()
        }
    }

    pub fn with_baseline(mut self, baseline_ndvi: f64) -> Self {
        self.baseline_ndvi = baseline_ndvi;
        self
    }

    pub fn with_image(mut self, reference: impl Into<String>) -> Self {
        self.image = Some(EvidenceImage {
            reference: reference.into(),
            content_type: "image/png".into(),
            byte_len: 0,
        });
        self
    }
}

enum Mode {
    Fixed(SimulatedProfile),
    Demo(Mutex<StdRng>),
}

/// Sensor source that never touches the network.
pub struct SimulatedSource {
    mode: Mode,
}

impl SimulatedSource {
    pub fn fixed(profile: SimulatedProfile) -> Self {
        Self {
            mode: Mode::Fixed(profile),
        }
    }

    /// Randomised demo readings. The same seed yields the same sequence.
    pub fn demo(seed: u64) -> Self {
        Self {
            mode: Mode::Demo(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

#[async_trait]
impl SensorSource for SimulatedSource {
    async fn fetch_reading(
        &self,
        _point: GeoPoint,
        kind: SensorKind,
        at: Option<DateTime<Utc>>,
    ) -> SensorReading {
        let at = at.unwrap_or_else(Utc::now);
        match &self.mode {
            Mode::Fixed(profile) => {
                let value = match kind {
                    SensorKind::OpticalNdvi => profile.ndvi,
                    SensorKind::SarBackscatter => profile.backscatter_db,
                };
                SensorReading::new(kind, value, at, SIMULATION_LABEL, profile.confidence)
            }
            Mode::Demo(rng) => {
                let mut rng = rng.lock().await;
                let value = match kind {
                    SensorKind::OpticalNdvi => rng.gen_range(0.05..0.8),
                    SensorKind::SarBackscatter => rng.gen_range(-22.0..-3.0),
                };
                SensorReading::new(kind, value, at, DEMO_LABEL, 0.8)
            }
        }
    }

    async fn fetch_image(&self, _point: GeoPoint) -> Option<EvidenceImage> {
        match &self.mode {
            Mode::Fixed(profile) => profile.image.clone(),
            Mode::Demo(_) => None,
        }
    }

    async fn change_window(&self, _point: GeoPoint) -> ChangeWindow {
        match &self.mode {
            Mode::Fixed(profile) => {
                ChangeWindow::between(profile.ndvi, profile.baseline_ndvi, SIMULATION_LABEL)
            }
            Mode::Demo(rng) => {
                let mut rng = rng.lock().await;
                let baseline = rng.gen_range(0.5..0.8);
                let current = if rng.gen_bool(DEMO_DEGRADATION_RATE) {
                    rng.gen_range(0.1..0.3)
                } else {
                    baseline * rng.gen_range(0.85..1.0)
                };
                debug!(baseline, current, "demo change window");
                ChangeWindow::between(current, baseline, DEMO_LABEL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT: GeoPoint = GeoPoint::new(10.0, 10.0);

    #[tokio::test]
    async fn fixed_profile_is_deterministic() {
        let source = SimulatedSource::fixed(SimulatedProfile::new(0.2, -4.0).with_baseline(0.8));
        let ndvi = source.fetch_reading(POINT, SensorKind::OpticalNdvi, None).await;
        let sar = source.fetch_reading(POINT, SensorKind::SarBackscatter, None).await;
        assert_eq!(ndvi.value, 0.2);
        assert_eq!(sar.value, -4.0);
        assert_eq!(ndvi.source_label, SIMULATION_LABEL);

        let window = source.change_window(POINT).await;
        assert_eq!(window.baseline, 0.8);
        assert!((window.deviation - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn stable_profile_has_no_deviation() {
        let source = SimulatedSource::fixed(SimulatedProfile::stable());
        assert_eq!(source.change_window(POINT).await.deviation, 0.0);
        assert!(source.fetch_image(POINT).await.is_none());
    }

    #[tokio::test]
    async fn demo_is_reproducible_per_seed() {
        let a = SimulatedSource::demo(7);
        let b = SimulatedSource::demo(7);
        for _ in 0..5 {
            let wa = a.change_window(POINT).await;
            let wb = b.change_window(POINT).await;
            assert_eq!(wa, wb);
            assert!((0.5..0.8).contains(&wa.baseline));
        }
        let ra = a.fetch_reading(POINT, SensorKind::SarBackscatter, None).await;
        let rb = b.fetch_reading(POINT, SensorKind::SarBackscatter, None).await;
        assert_eq!(ra.value, rb.value);
        assert!((-22.0..-3.0).contains(&ra.value));
    }

    #[tokio::test]
    async fn demo_mixes_stable_and_degraded_sites() {
        let source = SimulatedSource::demo(42);
        let mut degraded = 0;
        for _ in 0..200 {
            if source.change_window(POINT).await.deviation > 0.16 {
                degraded += 1;
            }
        }
        // 40% expected; stable draws never exceed 15% deviation.
        assert!((40..=120).contains(&degraded), "degraded = {degraded}");
    }
}
