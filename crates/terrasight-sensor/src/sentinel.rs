//! Sentinel Hub client: OAuth2 client-credentials, Statistics API for
//! readings, Process API for the true-colour evidence image.
//!
//! The client owns its token cache and offline flag. After
//! [`MAX_AUTH_FAILURES`] consecutive authentication failures, or when built
//! without usable credentials, it stops calling upstream and serves the
//! offline simulation profile.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use terrasight_core::{EvidenceImage, GeoPoint, SensorKind, SensorReading, hex_encode};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::SensorError;
use crate::source::SensorSource;

pub const DEFAULT_BASE_URL: &str = "https://services.sentinel-hub.com";
pub const OFFLINE_LABEL: &str = "OFFLINE SATELLITE SIMULATION";
pub const ERROR_LABEL: &str = "API Error";
pub const MAX_AUTH_FAILURES: u32 = 3;

const TOKEN_PATH: &str = "/oauth/token";
const STATISTICS_PATH: &str = "/api/v1/statistics";
const PROCESS_PATH: &str = "/api/v1/process";

/// Refresh the token this long before the server says it expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 5;
/// Half-width of the sampled box for readings (~10 m).
const SAMPLE_DELTA_DEG: f64 = 0.0001;
/// Half-width of the evidence image box (~200 m).
const IMAGE_DELTA_DEG: f64 = 0.002;
const STATS_WINDOW_DAYS: i64 = 15;
const IMAGE_WINDOW_DAYS: i64 = 30;
const IMAGE_SIZE_PX: u32 = 1024;
const IMAGE_MAX_CLOUD_COVERAGE: u32 = 20;
const CRS_WGS84: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

const EVALSCRIPT_NDVI: &str = r#"//VERSION=3
function setup() {
  return {
    input: ["B04", "B08", "dataMask"],
    output: [
      { id: "default", bands: 1, sampleType: "FLOAT32" },
      { id: "dataMask", bands: 1 }
    ]
  };
}
function evaluatePixel(sample) {
  let ndvi = (sample.B08 - sample.B04) / (sample.B08 + sample.B04);
  return { default: [ndvi], dataMask: [sample.dataMask] };
}"#;

const EVALSCRIPT_SAR_DB: &str = r#"//VERSION=3
function setup() {
  return {
    input: ["VV", "dataMask"],
    output: [
      { id: "default", bands: 1, sampleType: "FLOAT32" },
      { id: "dataMask", bands: 1 }
    ]
  };
}
function evaluatePixel(sample) {
  return { default: [10 * Math.log10(Math.max(sample.VV, 0.0001))], dataMask: [sample.dataMask] };
}"#;

const EVALSCRIPT_TRUE_COLOR: &str = r#"//VERSION=3
function setup() {
  return { input: ["B04", "B03", "B02", "dataMask"], output: { bands: 4 } };
}
function evaluatePixel(sample) {
  return [sample.B04 * 2.5, sample.B03 * 2.5, sample.B02 * 2.5, sample.dataMask];
}"#;

#[derive(Clone)]
pub struct SentinelConfig {
    /// e.g. `https://services.sentinel-hub.com` (no trailing slash needed).
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout: StdDuration,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: None,
            client_secret: None,
            timeout: StdDuration::from_secs(20),
        }
    }
}

impl fmt::Debug for SentinelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SentinelConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// A client id is present and is not a placeholder such as `YOUR_CLIENT_ID`.
    pub fn has_credentials(&self) -> bool {
        matches!(&self.client_id, Some(id) if !id.trim().is_empty() && !id.contains("YOUR_"))
    }
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

// Statistics API response: data[0].outputs.default.bands.B0.stats.mean
#[derive(Deserialize)]
struct StatsResponse {
    #[serde(default)]
    data: Vec<StatsInterval>,
}

#[derive(Deserialize)]
struct StatsInterval {
    outputs: Option<HashMap<String, StatsOutput>>,
}

#[derive(Deserialize)]
struct StatsOutput {
    #[serde(default)]
    bands: HashMap<String, BandStats>,
}

#[derive(Deserialize)]
struct BandStats {
    stats: Option<HashMap<String, Value>>,
}

impl StatsResponse {
    /// Mean of the first interval's single output band. `None` for cloud
    /// cover or empty coverage; the API reports those as a missing interval
    /// or a `"NaN"` string.
    fn mean(&self) -> Option<f64> {
        self.data
            .first()?
            .outputs
            .as_ref()?
            .get("default")?
            .bands
            .get("B0")?
            .stats
            .as_ref()?
            .get("mean")?
            .as_f64()
            .filter(|v| v.is_finite())
    }
}

/// Live Sentinel Hub source.
pub struct SentinelClient {
    client: reqwest::Client,
    config: SentinelConfig,
    token: Mutex<Option<CachedToken>>,
    auth_failures: AtomicU32,
    offline: AtomicBool,
}

impl SentinelClient {
    pub fn new(config: SentinelConfig) -> Result<Self, SensorError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let offline = !config.has_credentials();
        if offline {
            warn!("no Sentinel Hub credentials configured; serving offline simulation");
        }
        let config = SentinelConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
            auth_failures: AtomicU32::new(0),
            offline: AtomicBool::new(offline),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    /// A valid bearer token, refreshing when needed. `None` in offline mode
    /// or when authentication fails.
    async fn token(&self) -> Option<String> {
        if self.is_offline() {
            return None;
        }
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Utc::now() < t.expires_at) {
            return Some(token.value.clone());
        }

        match self.request_token().await {
            Ok(token) => {
                self.auth_failures.store(0, Ordering::Release);
                let value = token.value.clone();
                *cached = Some(token);
                Some(value)
            }
            Err(e) => {
                let failures = self.auth_failures.fetch_add(1, Ordering::AcqRel) + 1;
                warn!(error = %e, failures, "Sentinel Hub authentication failed");
                if failures >= MAX_AUTH_FAILURES {
                    self.offline.store(true, Ordering::Release);
                    warn!("repeated authentication failures; switching to offline simulation");
                }
                None
            }
        }
    }

    async fn request_token(&self) -> Result<CachedToken, SensorError> {
        let url = format!("{}{TOKEN_PATH}", self.config.base_url);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_deref().unwrap_or_default()),
            ("client_secret", self.config.client_secret.as_deref().unwrap_or_default()),
        ];

        let resp = self.client.post(&url).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SensorError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = resp.json().await?;
        let value = token.access_token.ok_or(SensorError::MissingToken)?;
        info!(expires_in = token.expires_in, "Sentinel Hub token acquired");
        Ok(CachedToken {
            value,
            expires_at: Utc::now() + Duration::seconds(token.expires_in - TOKEN_EXPIRY_MARGIN_SECS),
        })
    }

    async fn statistics(
        &self,
        token: &str,
        point: GeoPoint,
        kind: SensorKind,
        at: DateTime<Utc>,
    ) -> Result<Option<f64>, SensorError> {
        let url = format!("{}{STATISTICS_PATH}", self.config.base_url);
        let body = statistics_request(point, kind, at);

        info!(lat = point.lat, lng = point.lng, kind = %kind, "fetching Sentinel statistics");
        let resp = self.client.post(&url).bearer_auth(token).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SensorError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let stats: StatsResponse = serde_json::from_str(&text)?;
        Ok(stats.mean())
    }

    async fn true_colour_image(&self, token: &str, point: GeoPoint) -> Result<Option<EvidenceImage>, SensorError> {
        let url = format!("{}{PROCESS_PATH}", self.config.base_url);
        let body = image_request(point, Utc::now());

        info!(lat = point.lat, lng = point.lng, "fetching Sentinel true-colour image");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(ACCEPT, "image/png")
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SensorError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let digest = ring::digest::digest(&ring::digest::SHA256, &bytes);
        Ok(Some(EvidenceImage {
            reference: format!("sha256:{}", hex_encode(digest.as_ref())),
            content_type,
            byte_len: bytes.len(),
        }))
    }
}

#[async_trait]
impl SensorSource for SentinelClient {
    async fn fetch_reading(
        &self,
        point: GeoPoint,
        kind: SensorKind,
        at: Option<DateTime<Utc>>,
    ) -> SensorReading {
        let at = at.unwrap_or_else(Utc::now);
        let Some(token) = self.token().await else {
            return offline_reading(kind, at);
        };

        match self.statistics(&token, point, kind, at).await {
            Ok(Some(value)) => SensorReading::new(kind, value, at, live_label(kind), 1.0),
            Ok(None) => {
                info!(kind = %kind, "no usable pixels in window; using safe default");
                SensorReading::fallback(kind, at, live_label(kind))
            }
            Err(e) => {
                warn!(error = %e, kind = %kind, "Sentinel statistics request failed");
                SensorReading::fallback(kind, at, ERROR_LABEL)
            }
        }
    }

    async fn fetch_image(&self, point: GeoPoint) -> Option<EvidenceImage> {
        let token = self.token().await?;
        match self.true_colour_image(&token, point).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Sentinel image request failed");
                None
            }
        }
    }
}

fn live_label(kind: SensorKind) -> &'static str {
    match kind {
        SensorKind::OpticalNdvi => "SENTINEL-2 L2A (Live Stats)",
        SensorKind::SarBackscatter => "SENTINEL-1 GRD (Live Stats)",
    }
}

/// Healthy-landscape profile served when the client is offline.
fn offline_reading(kind: SensorKind, at: DateTime<Utc>) -> SensorReading {
    let value = match kind {
        SensorKind::OpticalNdvi => 0.4,
        SensorKind::SarBackscatter => -12.0,
    };
    SensorReading::new(kind, value, at, OFFLINE_LABEL, 0.8)
}

fn bbox(point: GeoPoint, delta: f64) -> [f64; 4] {
    [point.lng - delta, point.lat - delta, point.lng + delta, point.lat + delta]
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn statistics_request(point: GeoPoint, kind: SensorKind, at: DateTime<Utc>) -> Value {
    let from = rfc3339(at - Duration::days(STATS_WINDOW_DAYS));
    let to = rfc3339(at);
    let (collection, evalscript) = match kind {
        SensorKind::OpticalNdvi => ("sentinel-2-l2a", EVALSCRIPT_NDVI),
        SensorKind::SarBackscatter => ("sentinel-1-grd", EVALSCRIPT_SAR_DB),
    };
    json!({
        "input": {
            "bounds": {
                "bbox": bbox(point, SAMPLE_DELTA_DEG),
                "properties": { "crs": CRS_WGS84 }
            },
            "data": [{
                "type": collection,
                "dataFilter": {
                    "timeRange": { "from": from, "to": to },
                    "mosaickingOrder": "mostRecent"
                }
            }]
        },
        "aggregation": {
            "timeRange": { "from": from, "to": to },
            "aggregationInterval": { "of": "P1D", "lastIntervalBehavior": "SHORTEN" },
            "evalscript": evalscript,
            "width": 1,
            "height": 1
        }
    })
}

fn image_request(point: GeoPoint, at: DateTime<Utc>) -> Value {
    json!({
        "input": {
            "bounds": {
                "bbox": bbox(point, IMAGE_DELTA_DEG),
                "properties": { "crs": CRS_WGS84 }
            },
            "data": [{
                "type": "sentinel-2-l2a",
                "dataFilter": {
                    "timeRange": {
                        "from": rfc3339(at - Duration::days(IMAGE_WINDOW_DAYS)),
                        "to": rfc3339(at)
                    },
                    "mosaickingOrder": "mostRecent",
                    "maxCloudCoverage": IMAGE_MAX_CLOUD_COVERAGE
                }
            }]
        },
        "output": {
            "width": IMAGE_SIZE_PX,
            "height": IMAGE_SIZE_PX,
            "responses": [{ "identifier": "default", "format": { "type": "image/png" } }]
        },
        "evalscript": EVALSCRIPT_TRUE_COLOR
    })
}
