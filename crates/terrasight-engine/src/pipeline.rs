//! The orchestration state machine.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use terrasight_anchor::{Evidence, EvidenceAnchor};
use terrasight_core::{
    AnchorMode, ChangeWindow, DetectionRecord, FusedScene, GeoPoint, Severity, Verdict,
};
use terrasight_fusion::{
    ChangeSignal, DeforestationReport, MiningReport, analyze_deforestation, classify_terrain,
    detect_change, detect_illegal_mining,
};
use terrasight_governance::statutes::{FOREST_ACT, MINES_AND_MINERALS_ACT};
use terrasight_governance::{LegalVerdict, RuleBook, legal_notice};
use terrasight_sensor::{SensorSource, collect_scene};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sink::VerdictSink;
use crate::trace::{NoTrace, Stage, TraceSink};

const TRIBUNAL: &str = "National Green Tribunal (NGT)";
const ENCROACHMENT_CONFIDENCE: f64 = 0.99;
const NO_CHANGE: &str = "No Change Detected";

/// A violation chosen in RESOLVING, waiting to be anchored.
struct Candidate {
    legal: LegalVerdict,
    confidence: f64,
    message: String,
    /// Anchored violation string, e.g. `DEFORESTATION - LAND_CLEARING`.
    anchor_label: String,
    /// `violation_type` column of the persisted record.
    record_type: String,
    source: String,
}

/// Detection pipeline. Cheap to clone; every clone shares the same
/// read-only ruleset, anchoring service and sensor source.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn SensorSource>,
    rules: Arc<RuleBook>,
    anchor: Arc<EvidenceAnchor>,
    sink: Option<Arc<dyn VerdictSink>>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn SensorSource>, rules: Arc<RuleBook>, anchor: Arc<EvidenceAnchor>) -> Self {
        Self {
            source,
            rules,
            anchor,
            sink: None,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn VerdictSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run one cycle for a point. Never fails.
    pub async fn evaluate(&self, lat: f64, lng: f64, jurisdiction_hint: Option<&str>) -> Verdict {
        self.evaluate_traced(lat, lng, jurisdiction_hint, &NoTrace).await
    }

    pub async fn evaluate_traced(
        &self,
        lat: f64,
        lng: f64,
        jurisdiction_hint: Option<&str>,
        trace: &dyn TraceSink,
    ) -> Verdict {
        trace.line(Stage::Collecting, &format!("Processing location: {lat:.5}, {lng:.5}"));
        let point = match GeoPoint::checked(lat, lng) {
            Ok(point) => point,
            Err(e) => {
                warn!(error = %e, "rejecting cycle");
                trace.line(Stage::Done, "IGNORED: invalid coordinates");
                return Verdict::ignored("invalid coordinates");
            }
        };

        let hint = jurisdiction_hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let (scene, change) = tokio::join!(
            collect_scene(self.source.as_ref(), point, hint),
            self.source.change_window(point),
        );
        if let (Some(optical), Some(sar)) = (scene.optical(), scene.sar()) {
            trace.line(
                Stage::Collecting,
                &format!(
                    "Scene {} assembled: NDVI {:.3} [{}], SAR {:.1} dB [{}]",
                    scene.id, optical.value, optical.source_label, sar.value, sar.source_label
                ),
            );
        }

        self.process_scene(&scene, Some(&change), trace).await
    }

    /// CLASSIFYING through DONE for an already assembled scene.
    ///
    /// `change` is the rolling-baseline comparison; without it the generic
    /// change detector does not fire and deforestation uses the default baseline.
    pub async fn process_scene(
        &self,
        scene: &FusedScene,
        change: Option<&ChangeWindow>,
        trace: &dyn TraceSink,
    ) -> Verdict {
        let point = scene.centroid;
        trace.line(Stage::Classifying, "Analyzing spectral & structural signatures");

        let (Some(optical), Some(sar)) = (scene.optical(), scene.sar()) else {
            warn!(scene = %scene.id, "scene is missing a required reading");
            trace.line(Stage::Done, "IGNORED: incomplete scene");
            return Verdict::ignored("incomplete scene").with_scene(scene.id.clone(), None);
        };

        let terrain = classify_terrain(sar.value);
        // A fallback optical value is not a measurement of loss.
        let baseline = if optical.is_available() {
            change.map(|c| c.baseline)
        } else {
            trace.line(Stage::Classifying, &format!("Optical unavailable [{}]", optical.source_label));
            Some(optical.value)
        };
        let deforestation = analyze_deforestation(optical.value, baseline);
        let mining = detect_illegal_mining(sar.value, optical.value);
        let signal = change.map(detect_change);
        debug!(
            scene = %scene.id,
            deforestation = ?deforestation.detection(scene.image_ref()),
            mining = ?mining.detection(scene.image_ref()),
            change = ?signal.as_ref().map(ChangeSignal::detection),
            "detectors evaluated"
        );
        trace.line(
            Stage::Classifying,
            &format!(
                "Terrain {} ({:.2}); vegetation loss {:.1}%; mining {}",
                terrain.class.as_str(),
                terrain.confidence,
                deforestation.loss_percent,
                mining.kind.as_str()
            ),
        );

        let Some(candidate) = self.resolve(scene, &deforestation, &mining, signal.as_ref(), trace) else {
            trace.line(Stage::Resolving, "Analysis complete. No violations.");
            trace.line(Stage::Done, &format!("IGNORED: {NO_CHANGE}"));
            debug!(scene = %scene.id, "no violation");
            return Verdict::ignored(NO_CHANGE).with_scene(scene.id.clone(), Some(terrain));
        };

        let evidence = Evidence::new(point, &candidate.source, &candidate.anchor_label, candidate.confidence);
        let anchor = self.anchor.anchor(&evidence).await;
        let mode = match &anchor.mode {
            AnchorMode::Ledger { .. } => "ledger",
            AnchorMode::LocalOnly => "local",
        };
        trace.line(Stage::Anchoring, &format!("Evidence fingerprint {} ({mode})", anchor.fingerprint));

        let notice = legal_notice(&candidate.legal, point, Utc::now());
        let mut verdict = Verdict::verified(
            candidate.legal.into_violation(),
            candidate.confidence,
            anchor,
            candidate.message,
        )
        .with_scene(scene.id.clone(), Some(terrain));
        verdict.legal_notice = notice;
        verdict.evidence_image_ref = scene.image_ref().map(str::to_string);

        info!(
            lat = point.lat,
            lng = point.lng,
            violation = %candidate.record_type,
            fingerprint = ?verdict.anchor_fingerprint,
            "violation verified"
        );
        trace.line(Stage::Done, &format!("VERIFIED: {}", verdict.message));

        self.persist(point, &verdict, candidate.record_type);
        verdict
    }

    /// Priority: deforestation, mining, then generic change via the rule engine.
    fn resolve(
        &self,
        scene: &FusedScene,
        deforestation: &DeforestationReport,
        mining: &MiningReport,
        signal: Option<&ChangeSignal>,
        trace: &dyn TraceSink,
    ) -> Option<Candidate> {
        let optical_label = scene.optical().map(|r| r.source_label.as_str()).unwrap_or_default();
        let sar_label = scene.sar().map(|r| r.source_label.as_str()).unwrap_or_default();

        if deforestation.is_deforestation {
            let kind = deforestation.kind.as_str();
            trace.line(
                Stage::Resolving,
                &format!(
                    "DEFORESTATION DETECTED: {kind} | loss {:.1}% | severity {}",
                    deforestation.loss_percent, deforestation.severity
                ),
            );
            return Some(Candidate {
                legal: detector_verdict(
                    "Forest Conservation Act",
                    FOREST_ACT.description,
                    "Section 2",
                    deforestation.severity,
                    "Protected Forest",
                    "Restoration Order",
                ),
                confidence: deforestation.confidence,
                message: format!("Deforestation Detected: {:.1}% loss", deforestation.loss_percent),
                anchor_label: format!("DEFORESTATION - {kind}"),
                record_type: format!("DEFORESTATION_{kind}"),
                source: optical_label.to_string(),
            });
        }

        if mining.is_mining {
            let kind = mining.kind.as_str();
            let indicators: Vec<&str> = mining.indicators.iter().map(|i| i.as_str()).collect();
            trace.line(
                Stage::Resolving,
                &format!("ILLEGAL MINING DETECTED: {kind} | indicators {}", indicators.join(", ")),
            );
            return Some(Candidate {
                legal: detector_verdict(
                    "Mines and Minerals Act",
                    MINES_AND_MINERALS_ACT.description,
                    "Section 4",
                    mining.severity,
                    "Mining Zone",
                    "Seizure + Prosecution",
                ),
                confidence: mining.confidence,
                message: format!("Illegal Mining Detected: {kind}"),
                anchor_label: format!("ILLEGAL_MINING - {kind}"),
                record_type: format!("ILLEGAL_MINING_{kind}"),
                source: sar_label.to_string(),
            });
        }

        let signal = signal.filter(|s| s.is_violation)?;
        trace.line(
            Stage::Resolving,
            &format!("VARIANCE DETECTED: delta {:.1}%", signal.deviation * 100.0),
        );
        let legal = self.rules.resolve(scene.centroid, scene.jurisdiction_hint.as_deref());
        if !legal.is_violation {
            trace.line(Stage::Resolving, "Change lies outside every protected zone");
            return None;
        }
        trace.line(
            Stage::Resolving,
            &format!("Rule engine: {} | {} | {}", legal.law, legal.zone, legal.severity),
        );
        Some(Candidate {
            confidence: ENCROACHMENT_CONFIDENCE,
            message: "Encroachment Detected".to_string(),
            anchor_label: legal.law.clone(),
            record_type: legal.law.clone(),
            source: format!("{optical_label} / {sar_label}"),
            legal,
        })
    }

    /// Hand the record to the sink without waiting for it.
    fn persist(&self, point: GeoPoint, verdict: &Verdict, record_type: String) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let record = DetectionRecord::from_verdict(point, verdict, Some(record_type));
        let handle = tokio::spawn(async move {
            if let Err(e) = sink.persist(record).await {
                warn!(error = %e, "failed to persist detection record");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every record handed to the sink so far. Short-lived callers
    /// use this before the runtime shuts down.
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "sink task did not complete");
            }
        }
    }
}

fn detector_verdict(
    law: &str,
    article: &str,
    section: &str,
    severity: Severity,
    zone: &str,
    penalty: &str,
) -> LegalVerdict {
    LegalVerdict {
        is_violation: true,
        law: law.to_string(),
        article: article.to_string(),
        section: section.to_string(),
        severity,
        zone: zone.to_string(),
        penalty: penalty.to_string(),
        jurisdiction: TRIBUNAL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use terrasight_core::{SensorKind, SensorReading, VerdictStatus};
    use terrasight_sensor::{SimulatedProfile, SimulatedSource};
    use tokio::sync::mpsc;

    fn pipeline(profile: SimulatedProfile) -> Pipeline {
        Pipeline::new(
            Arc::new(SimulatedSource::fixed(profile)),
            Arc::new(RuleBook::builtin().unwrap()),
            Arc::new(EvidenceAnchor::offline()),
        )
    }

    fn scene(ndvi: Option<f64>, backscatter_db: Option<f64>) -> FusedScene {
        let now = Utc::now();
        let mut readings = BTreeMap::new();
        if let Some(v) = ndvi {
            readings.insert(
                SensorKind::OpticalNdvi,
                SensorReading::new(SensorKind::OpticalNdvi, v, now, "SENTINEL-2 L2A (Live Stats)", 1.0),
            );
        }
        if let Some(v) = backscatter_db {
            readings.insert(
                SensorKind::SarBackscatter,
                SensorReading::new(SensorKind::SarBackscatter, v, now, "SENTINEL-1 GRD (Live Stats)", 1.0),
            );
        }
        FusedScene {
            id: "SCENE-TEST".into(),
            centroid: GeoPoint::new(10.0, 10.0),
            timestamp: now,
            jurisdiction_hint: None,
            readings,
            alignment_quality: 5.0,
            image: None,
        }
    }

    /// Stable vegetation that dropped 20% against its baseline: only the
    /// generic change detector fires.
    fn encroachment_profile() -> SimulatedProfile {
        SimulatedProfile::new(0.4, -12.0).with_baseline(0.5)
    }

    /// Live SAR and a live 0.7 optical baseline; the current optical
    /// reading is lost to an upstream error.
    struct DegradedOptical;

    #[async_trait]
    impl SensorSource for DegradedOptical {
        async fn fetch_reading(
            &self,
            _point: GeoPoint,
            kind: SensorKind,
            at: Option<chrono::DateTime<Utc>>,
        ) -> SensorReading {
            let at = at.unwrap_or_else(Utc::now);
            match kind {
                SensorKind::SarBackscatter => SensorReading::new(kind, -12.0, at, "SENTINEL-1 GRD (Live Stats)", 1.0),
                SensorKind::OpticalNdvi if Utc::now() - at > chrono::Duration::days(1) => {
                    SensorReading::new(kind, 0.7, at, "SENTINEL-2 L2A (Live Stats)", 1.0)
                }
                SensorKind::OpticalNdvi => SensorReading::fallback(kind, at, "API Error"),
            }
        }

        async fn fetch_image(&self, _point: GeoPoint) -> Option<terrasight_core::EvidenceImage> {
            None
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<DetectionRecord>);

    #[async_trait]
    impl VerdictSink for ChannelSink {
        async fn persist(&self, record: DetectionRecord) -> Result<(), SinkError> {
            self.0
                .send(record)
                .map_err(|e| SinkError::Rejected(e.to_string()))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl VerdictSink for FailingSink {
        async fn persist(&self, _record: DetectionRecord) -> Result<(), SinkError> {
            Err(SinkError::Rejected("database offline".into()))
        }
    }

    #[tokio::test]
    async fn deforestation_beats_mining() {
        let p = pipeline(SimulatedProfile::stable());
        // NDVI 0.2 vs 0.8 is LAND_CLEARING; -4 dB over NDVI 0.2 is also a mining signature.
        let window = ChangeWindow::between(0.2, 0.8, "test");
        let verdict = p.process_scene(&scene(Some(0.2), Some(-4.0)), Some(&window), &NoTrace).await;

        assert_eq!(verdict.status, VerdictStatus::Verified);
        let violation = verdict.violation.as_ref().unwrap();
        assert_eq!(violation.law, "Forest Conservation Act");
        assert_eq!(violation.section, "Section 2");
        assert_eq!(violation.penalty, "Restoration Order");
        assert_eq!(violation.zone, "Protected Forest");
        assert_eq!(violation.severity, Severity::Critical);
        assert_eq!(verdict.confidence, 0.98);
        assert_eq!(verdict.message, "Deforestation Detected: 75.0% loss");

        let anchor = verdict.anchor.as_ref().unwrap();
        assert!(anchor.metadata.contains("DEFORESTATION - LAND_CLEARING"));
        assert!(anchor.metadata.contains("SENTINEL-2 L2A (Live Stats)"));
        assert_eq!(verdict.anchor_fingerprint.as_deref(), Some(anchor.fingerprint.as_str()));
    }

    #[tokio::test]
    async fn mining_when_vegetation_is_stable() {
        let p = pipeline(SimulatedProfile::stable());
        let window = ChangeWindow::between(0.05, 0.05, "test");
        let verdict = p.process_scene(&scene(Some(0.05), Some(-4.0)), Some(&window), &NoTrace).await;

        let violation = verdict.violation.as_ref().unwrap();
        assert_eq!(violation.law, "Mines and Minerals Act");
        assert_eq!(violation.penalty, "Seizure + Prosecution");
        assert_eq!(violation.zone, "Mining Zone");
        assert_eq!(violation.severity, Severity::Critical);
        assert_eq!(verdict.confidence, 0.96);
        assert_eq!(verdict.message, "Illegal Mining Detected: OPEN_PIT");
        assert!(verdict.anchor.unwrap().metadata.contains("ILLEGAL_MINING - OPEN_PIT"));
    }

    #[tokio::test]
    async fn sand_mining_signature() {
        let p = pipeline(SimulatedProfile::stable());
        let window = ChangeWindow::between(0.15, 0.15, "test");
        let verdict = p.process_scene(&scene(Some(0.15), Some(-20.0)), Some(&window), &NoTrace).await;
        assert_eq!(verdict.message, "Illegal Mining Detected: SAND_MINING");
        assert_eq!(verdict.violation.unwrap().severity, Severity::Warning);
    }

    #[tokio::test]
    async fn encroachment_resolved_by_jurisdiction_code() {
        let p = pipeline(encroachment_profile());
        let verdict = p.evaluate(28.6, 77.25, Some("DELHI")).await;

        assert!(verdict.is_verified());
        assert_eq!(verdict.message, "Encroachment Detected");
        assert_eq!(verdict.confidence, 0.99);
        let violation = verdict.violation.as_ref().unwrap();
        assert_eq!(violation.zone, "Yamuna Floodplain (Okhla)");
        assert_eq!(violation.severity, Severity::Critical);
        assert!(verdict.anchor.as_ref().unwrap().metadata.contains("Delhi Land Reforms Act, 1954"));
        assert!(verdict.legal_notice.as_deref().unwrap().contains("Immediate Demolition & Fine"));
        assert!(verdict.scene_id.is_some());
        assert!(verdict.terrain.is_some());
    }

    #[tokio::test]
    async fn encroachment_resolved_by_geometry_without_hint() {
        let p = pipeline(encroachment_profile());
        let verdict = p.evaluate(28.63, 77.30, None).await;
        let violation = verdict.violation.unwrap();
        assert!(violation.zone.starts_with("Yamuna Floodplains"));
        assert_eq!(violation.jurisdiction, "Supreme Court of India");
    }

    #[tokio::test]
    async fn change_outside_every_zone_is_ignored() {
        let p = pipeline(encroachment_profile());
        let verdict = p.evaluate(10.0, 10.0, None).await;
        assert_eq!(verdict.status, VerdictStatus::Ignored);
        assert_eq!(verdict.message, "No Change Detected");
    }

    #[tokio::test]
    async fn stable_readings_are_ignored_every_time() {
        let p = pipeline(SimulatedProfile::stable());
        let first = p.evaluate(10.0, 10.0, None).await;
        let second = p.evaluate(10.0, 10.0, None).await;
        for verdict in [&first, &second] {
            assert_eq!(verdict.status, VerdictStatus::Ignored);
            assert_eq!(verdict.message, "No Change Detected");
            assert_eq!(verdict.confidence, 0.0);
            assert!(verdict.anchor_fingerprint.is_none());
            assert!(verdict.violation.is_none());
        }
    }

    #[tokio::test]
    async fn invalid_coordinates_are_ignored() {
        let p = pipeline(SimulatedProfile::stable());
        for (lat, lng) in [(f64::NAN, 0.0), (91.0, 0.0), (0.0, -180.5)] {
            let verdict = p.evaluate(lat, lng, None).await;
            assert_eq!(verdict.status, VerdictStatus::Ignored);
            assert_eq!(verdict.message, "invalid coordinates");
        }
    }

    #[tokio::test]
    async fn incomplete_scene_is_ignored() {
        let p = pipeline(SimulatedProfile::stable());
        let window = ChangeWindow::between(0.2, 0.8, "test");
        let verdict = p.process_scene(&scene(Some(0.2), None), Some(&window), &NoTrace).await;
        assert_eq!(verdict.status, VerdictStatus::Ignored);
        assert_eq!(verdict.message, "incomplete scene");
        assert_eq!(verdict.scene_id.as_deref(), Some("SCENE-TEST"));
    }

    #[tokio::test]
    async fn failed_optical_fetch_is_not_evidence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let p = Pipeline::new(
            Arc::new(DegradedOptical),
            Arc::new(RuleBook::builtin().unwrap()),
            Arc::new(EvidenceAnchor::offline()),
        )
        .with_sink(Arc::new(ChannelSink(tx)));

        let verdict = p.evaluate(10.0, 10.0, None).await;
        assert_eq!(verdict.status, VerdictStatus::Ignored);
        assert_eq!(verdict.message, "No Change Detected");
        assert!(verdict.violation.is_none());
        assert!(verdict.legal_notice.is_none());

        p.flush().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn fallback_scene_against_live_window_is_ignored() {
        let p = pipeline(SimulatedProfile::stable());
        let mut degraded = scene(None, Some(-12.0));
        degraded.readings.insert(
            SensorKind::OpticalNdvi,
            SensorReading::fallback(SensorKind::OpticalNdvi, Utc::now(), "API Error"),
        );
        let window = ChangeWindow::between(0.75, 0.8, "SENTINEL-2 L2A (Live Stats)");
        let verdict = p.process_scene(&degraded, Some(&window), &NoTrace).await;
        assert_eq!(verdict.status, VerdictStatus::Ignored);
        assert_eq!(verdict.message, "No Change Detected");
    }

    #[tokio::test]
    async fn without_window_no_generic_change() {
        let p = pipeline(SimulatedProfile::stable());
        // NDVI 0.6 against the default 0.65 baseline is under 10% loss.
        let verdict = p.process_scene(&scene(Some(0.6), Some(-12.0)), None, &NoTrace).await;
        assert_eq!(verdict.message, "No Change Detected");
    }

    #[tokio::test]
    async fn trace_walks_every_stage() {
        let p = pipeline(SimulatedProfile::new(0.2, -12.0).with_baseline(0.8));
        let stages = Mutex::new(Vec::new());
        let lines = Mutex::new(Vec::new());
        let trace = |stage: Stage, msg: &str| {
            let mut stages = stages.lock().unwrap();
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
            lines.lock().unwrap().push(msg.to_string());
        };
        p.evaluate_traced(28.6, 77.2, None, &trace).await;

        assert_eq!(
            stages.lock().unwrap().as_slice(),
            [
                Stage::Collecting,
                Stage::Classifying,
                Stage::Resolving,
                Stage::Anchoring,
                Stage::Done
            ]
        );
        let lines = lines.lock().unwrap();
        assert_eq!(lines[0], "Processing location: 28.60000, 77.20000");
        assert!(lines.iter().any(|l| l.starts_with("DEFORESTATION DETECTED: LAND_CLEARING")));
    }

    #[tokio::test]
    async fn sink_receives_verified_record() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let profile = SimulatedProfile::new(0.2, -12.0)
            .with_baseline(0.8)
            .with_image("sha256:abc123");
        let p = pipeline(profile).with_sink(Arc::new(ChannelSink(tx)));

        let verdict = p.evaluate(28.6, 77.2, None).await;
        let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.status, VerdictStatus::Verified);
        assert_eq!(record.violation_type.as_deref(), Some("DEFORESTATION_LAND_CLEARING"));
        assert_eq!(record.active_zone.as_deref(), Some("Protected Forest"));
        assert_eq!(record.severity, Some(Severity::Critical));
        assert_eq!(record.img_url.as_deref(), Some("sha256:abc123"));
        assert_eq!(record.anchor_fingerprint, verdict.anchor_fingerprint);
        assert_eq!((record.lat, record.lng), (28.6, 77.2));
    }

    #[tokio::test]
    async fn ignored_verdicts_are_not_persisted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let p = pipeline(SimulatedProfile::stable()).with_sink(Arc::new(ChannelSink(tx)));
        p.evaluate(10.0, 10.0, None).await;
        assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn sink_failure_does_not_change_verdict() {
        let p = pipeline(encroachment_profile()).with_sink(Arc::new(FailingSink));
        let verdict = p.evaluate(28.6, 77.25, Some("DELHI")).await;
        assert!(verdict.is_verified());
        assert!(verdict.anchor_fingerprint.is_some());
    }

    #[tokio::test]
    async fn flush_waits_for_json_lines_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let p = pipeline(encroachment_profile()).with_sink(Arc::new(crate::JsonLinesSink::new(&path)));
        p.evaluate(28.6, 77.25, Some("DELHI")).await;
        p.evaluate(28.6, 77.26, Some("DELHI")).await;
        p.flush().await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["violation_type"], "Delhi Land Reforms Act, 1954");
        assert_eq!(first["status"], "VERIFIED");
    }

    #[tokio::test]
    async fn concurrent_cycles_are_independent() {
        let p = pipeline(encroachment_profile());
        let cycles = (0..8).map(|i| {
            let p = p.clone();
            tokio::spawn(async move { p.evaluate(28.6, 77.21 + i as f64 * 0.01, Some("DELHI")).await })
        });
        let verdicts: Vec<Verdict> = futures::future::join_all(cycles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert!(verdicts.iter().all(Verdict::is_verified));
        let mut fingerprints: Vec<_> = verdicts.iter().map(|v| v.anchor_fingerprint.clone()).collect();
        fingerprints.sort();
        fingerprints.dedup();
        assert_eq!(fingerprints.len(), 8);
    }
}
