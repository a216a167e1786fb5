//! Protected-zone dataset.
//!
//! The dataset is a GeoJSON `FeatureCollection`. Each `Polygon` or
//! `MultiPolygon` feature becomes a [`ProtectedZone`]; other geometry types
//! are skipped. Properties:
//!
//! - `name` (required): zone label used in verdicts
//! - `zone_type`: `FOREST` | `RIVER` | `WETLAND`, defaults to `FOREST`
//! - `severity`: core-zone severity (`INFO` | `WARNING` | `HIGH` | `CRITICAL`,
//!   any case), defaults to `CRITICAL`; any other value rejects the dataset
//!
//! A [`RuleBook`] is loaded once and shared read-only.

use std::path::Path;

use serde::Deserialize;
use terrasight_core::{GeoPoint, Severity};
use tracing::{info, warn};

use crate::RulesError;
use crate::geometry::Polygon;
use crate::statutes::ZoneType;

/// Width of the buffer ring around every protected zone.
pub const BUFFER_METRES: f64 = 100.0;

const BUILTIN_DATASET: &str = include_str!("../data/protected_zones.geojson");

// ── GeoJSON wire types ──

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    version: Option<String>,
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: ZoneProperties,
}

#[derive(Deserialize, Default)]
struct ZoneProperties {
    id: Option<String>,
    name: Option<String>,
    zone_type: Option<String>,
    severity: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
    #[serde(other)]
    Unsupported,
}

// ── Zones ──

#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedZone {
    pub id: Option<String>,
    pub name: String,
    pub zone_type: ZoneType,
    pub severity: Severity,
    pub polygons: Vec<Polygon>,
}

impl ProtectedZone {
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.polygons.iter().any(|p| p.contains(point))
    }

    pub fn buffered_contains(&self, point: GeoPoint, buffer_m: f64) -> bool {
        self.polygons.iter().any(|p| p.buffered_contains(point, buffer_m))
    }
}

/// The static, read-only ruleset of protected zones.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    version: Option<String>,
    zones: Vec<ProtectedZone>,
}

impl RuleBook {
    /// Zones compiled into the crate.
    pub fn builtin() -> Result<Self, RulesError> {
        Self::from_geojson(BUILTIN_DATASET)
    }

    /// Load a dataset from a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        if !path.exists() {
            return Err(RulesError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let book = Self::from_geojson(&text)?;
        info!(path = %path.display(), zones = book.zones.len(), "loaded protected-zone ruleset");
        Ok(book)
    }

    /// Parse a GeoJSON `FeatureCollection`.
    pub fn from_geojson(text: &str) -> Result<Self, RulesError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        let mut zones = Vec::with_capacity(collection.features.len());

        for (index, feature) in collection.features.into_iter().enumerate() {
            let rings_per_polygon = match feature.geometry {
                Some(Geometry::Polygon { coordinates }) => vec![coordinates],
                Some(Geometry::MultiPolygon { coordinates }) => coordinates,
                Some(Geometry::Unsupported) | None => continue,
            };

            let props = feature.properties;
            let name = props.name.ok_or_else(|| RulesError::InvalidZone {
                name: props.id.clone().unwrap_or_else(|| format!("feature #{index}")),
                reason: "missing name property".into(),
            })?;

            let mut polygons = Vec::with_capacity(rings_per_polygon.len());
            for rings in rings_per_polygon {
                if let Some(ring) = rings.iter().find(|r| !is_closed_ring(r)) {
                    return Err(RulesError::InvalidZone {
                        name,
                        reason: format!("ring with {} positions is not a closed linear ring", ring.len()),
                    });
                }
                if let Some(poly) = Polygon::from_rings(rings) {
                    polygons.push(poly);
                }
            }
            if polygons.is_empty() {
                return Err(RulesError::InvalidZone {
                    name,
                    reason: "polygon has no exterior ring".into(),
                });
            }

            let severity = parse_severity(&name, props.severity.as_deref())?;
            zones.push(ProtectedZone {
                id: props.id,
                name,
                zone_type: ZoneType::from_tag(props.zone_type.as_deref()),
                severity,
                polygons,
            });
        }

        if zones.is_empty() {
            warn!("ruleset contains no protected zones; geometry lookups will never match");
        }

        Ok(Self {
            version: collection.version,
            zones,
        })
    }

    pub fn zones(&self) -> &[ProtectedZone] {
        &self.zones
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// First zone (dataset order) that strictly contains `point`.
    pub fn zone_containing(&self, point: GeoPoint) -> Option<&ProtectedZone> {
        self.zones.iter().find(|z| z.contains(point))
    }

    /// First zone whose buffer ring contains `point`.
    pub fn zone_buffering(&self, point: GeoPoint) -> Option<&ProtectedZone> {
        self.zones
            .iter()
            .find(|z| z.buffered_contains(point, BUFFER_METRES))
    }
}

fn is_closed_ring(ring: &[[f64; 2]]) -> bool {
    ring.len() >= 4 && ring.first() == ring.last()
}

fn parse_severity(name: &str, tag: Option<&str>) -> Result<Severity, RulesError> {
    let Some(tag) = tag else {
        return Ok(Severity::Critical);
    };
    match tag.trim().to_ascii_uppercase().as_str() {
        "INFO" => Ok(Severity::Info),
        "WARNING" => Ok(Severity::Warning),
        "HIGH" => Ok(Severity::High),
        "CRITICAL" => Ok(Severity::Critical),
        _ => Err(RulesError::InvalidZone {
            name: name.to_string(),
            reason: format!("unknown severity {tag:?}"),
        }),
    }
}
