//! Statute templates and the jurisdiction-code table.

use serde::Serialize;
use terrasight_core::{GeoPoint, Severity};

/// Protected-zone category; selects the statute template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    Forest,
    River,
    Wetland,
}

impl ZoneType {
    /// Parse a `zone_type` tag. Missing or unrecognised tags map to `Forest`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_uppercase()).as_deref() {
            Some("RIVER") => Self::River,
            Some("WETLAND") => Self::Wetland,
            _ => Self::Forest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forest => "FOREST",
            Self::River => "RIVER",
            Self::Wetland => "WETLAND",
        }
    }

    pub fn statute(&self) -> &'static Statute {
        match self {
            Self::Forest => &FOREST_ACT,
            Self::River => &MINES_AND_MINERALS_ACT,
            Self::Wetland => &ENVIRONMENT_PROTECTION_ACT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statute {
    pub act: &'static str,
    pub section: &'static str,
    pub description: &'static str,
}

pub const FOREST_ACT: Statute = Statute {
    act: "Forest (Conservation) Act, 1980",
    section: "Section 2",
    description: "Restriction on the dereservation of forests or use of forest land for non-forest purpose.",
};

pub const MINES_AND_MINERALS_ACT: Statute = Statute {
    act: "Mines and Minerals (Development and Regulation) Act, 1957",
    section: "Section 4(1)",
    description: "No person shall undertake any reconnaissance, prospecting or mining operations in any area, \
                  except under and in accordance with the terms and conditions of a reconnaissance permit.",
};

pub const ENVIRONMENT_PROTECTION_ACT: Statute = Statute {
    act: "Environment (Protection) Act, 1986",
    section: "Section 3",
    description: "Prohibition of interactions detrimental to the ecological character of wetlands.",
};

// ── Jurisdiction-code table ──

/// Open latitude/longitude box: bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat > self.min_lat
            && point.lat < self.max_lat
            && point.lng > self.min_lng
            && point.lng < self.max_lng
    }
}

/// Text and severity of one jurisdiction outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JurisdictionTerms {
    pub article: &'static str,
    pub section: &'static str,
    pub severity: Severity,
    pub zone: &'static str,
    pub penalty: &'static str,
}

/// An environmentally sensitive area inside a jurisdiction whose terms
/// replace the jurisdiction's defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubZone {
    pub bounds: BoundingBox,
    pub terms: JurisdictionTerms,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JurisdictionRule {
    pub code: &'static str,
    pub law: &'static str,
    pub authority: &'static str,
    pub terms: JurisdictionTerms,
    pub sub_zone: Option<SubZone>,
}

impl JurisdictionRule {
    /// Terms for `point`: the sub-zone's when the point is inside it.
    pub fn terms_at(&self, point: GeoPoint) -> &JurisdictionTerms {
        match &self.sub_zone {
            Some(sub) if sub.bounds.contains(point) => &sub.terms,
            _ => &self.terms,
        }
    }
}

pub const JURISDICTIONS: &[JurisdictionRule] = &[
    JurisdictionRule {
        code: "DELHI",
        law: "Delhi Land Reforms Act, 1954",
        authority: "Delhi High Court / DDA",
        terms: JurisdictionTerms {
            article: "Restriction on Non-Agricultural Use",
            section: "Section 81",
            severity: Severity::High,
            zone: "Delhi NCR Green Belt",
            penalty: "Vesting of Land in Gaon Sabha",
        },
        sub_zone: Some(SubZone {
            // Okhla stretch of the Yamuna.
            bounds: BoundingBox {
                min_lat: 28.5,
                max_lat: 28.7,
                min_lng: 77.2,
                max_lng: 77.35,
            },
            terms: JurisdictionTerms {
                article: "Yamuna Floodplain Protection",
                section: "Section 23 (Eco-Sensitive Zone)",
                severity: Severity::Critical,
                zone: "Yamuna Floodplain (Okhla)",
                penalty: "Immediate Demolition & Fine",
            },
        }),
    },
    JurisdictionRule {
        code: "UP",
        law: "UP Zamindari Abolition & Land Reforms Act, 1950",
        authority: "Board of Revenue, UP",
        terms: JurisdictionTerms {
            article: "Prohibition on wrongful occupation of Gram Sabha land",
            section: "Section 122-B",
            severity: Severity::High,
            zone: "State Agricultural Reserve",
            penalty: "Eviction & Damages Recovery",
        },
        sub_zone: None,
    },
];

/// Applied to any code not in [`JURISDICTIONS`].
pub const DEFAULT_JURISDICTION: JurisdictionRule = JurisdictionRule {
    code: "DEFAULT",
    law: "Environment (Protection) Act, 1986",
    authority: "NGT",
    terms: JurisdictionTerms {
        article: "Unauthorized Development",
        section: "Section 15",
        severity: Severity::Warning,
        zone: "Unregulated Zone",
        penalty: "Notice",
    },
    sub_zone: None,
};

/// Look up a jurisdiction by code, case-insensitively.
pub fn jurisdiction(code: &str) -> &'static JurisdictionRule {
    let code = code.trim();
    JURISDICTIONS
        .iter()
        .find(|j| j.code.eq_ignore_ascii_case(code))
        .unwrap_or(&DEFAULT_JURISDICTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_type_tags() {
        assert_eq!(ZoneType::from_tag(Some("RIVER")), ZoneType::River);
        assert_eq!(ZoneType::from_tag(Some("wetland")), ZoneType::Wetland);
        assert_eq!(ZoneType::from_tag(Some("DESERT")), ZoneType::Forest);
        assert_eq!(ZoneType::from_tag(None), ZoneType::Forest);
    }

    #[test]
    fn zone_type_selects_statute() {
        assert_eq!(ZoneType::Forest.statute().act, "Forest (Conservation) Act, 1980");
        assert_eq!(ZoneType::River.statute().section, "Section 4(1)");
        assert_eq!(ZoneType::Wetland.statute().act, "Environment (Protection) Act, 1986");
    }

    #[test]
    fn jurisdiction_lookup_is_case_insensitive() {
        assert_eq!(jurisdiction("delhi").code, "DELHI");
        assert_eq!(jurisdiction(" UP ").code, "UP");
        assert_eq!(jurisdiction("KERALA").code, "DEFAULT");
    }

    #[test]
    fn sub_zone_bounds_are_exclusive() {
        let delhi = jurisdiction("DELHI");
        assert_eq!(delhi.terms_at(GeoPoint::new(28.6, 77.25)).severity, Severity::Critical);
        assert_eq!(delhi.terms_at(GeoPoint::new(28.7, 77.25)).severity, Severity::High);
        assert_eq!(delhi.terms_at(GeoPoint::new(28.6, 77.2)).severity, Severity::High);
    }
}
