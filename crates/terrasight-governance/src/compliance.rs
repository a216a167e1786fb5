//! Rule-engine verdicts, by jurisdiction code and by protected-zone geometry.

use serde::Serialize;
use terrasight_core::{GeoPoint, Severity, Violation};
use tracing::debug;

use crate::statutes::jurisdiction;
use crate::zones::{ProtectedZone, RuleBook};

const CORE_ZONE_PENALTY: &str = "Immediate Sealing & Prosecution";
const CORE_ZONE_AUTHORITY: &str = "Supreme Court of India";
const BUFFER_PENALTY: &str = "Show Cause Notice";
const BUFFER_AUTHORITY: &str = "National Green Tribunal (NGT)";

/// The rule engine's answer for one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalVerdict {
    pub is_violation: bool,
    pub law: String,
    pub article: String,
    pub section: String,
    pub severity: Severity,
    pub zone: String,
    pub penalty: String,
    pub jurisdiction: String,
}

impl LegalVerdict {
    /// Answer for a point outside every protected zone.
    pub fn no_violation() -> Self {
        Self {
            is_violation: false,
            law: "N/A".into(),
            article: "N/A".into(),
            section: "N/A".into(),
            severity: Severity::Info,
            zone: "Unregulated Zone".into(),
            penalty: "None".into(),
            jurisdiction: "N/A".into(),
        }
    }

    pub fn into_violation(self) -> Violation {
        Violation {
            law: self.law,
            section: self.section,
            penalty: self.penalty,
            severity: self.severity,
            zone: self.zone,
            article: self.article,
            jurisdiction: self.jurisdiction,
        }
    }

    fn core_zone(zone: &ProtectedZone) -> Self {
        let statute = zone.zone_type.statute();
        Self {
            is_violation: true,
            law: statute.act.into(),
            article: statute.description.into(),
            section: statute.section.into(),
            severity: zone.severity,
            zone: zone.name.clone(),
            penalty: CORE_ZONE_PENALTY.into(),
            jurisdiction: CORE_ZONE_AUTHORITY.into(),
        }
    }

    fn buffer_zone(zone: &ProtectedZone) -> Self {
        let statute = zone.zone_type.statute();
        Self {
            is_violation: true,
            law: statute.act.into(),
            article: format!("{} (Buffer Zone Violation)", statute.description),
            section: format!("{} r/w Rule 3", statute.section),
            severity: zone.severity.downgrade(),
            zone: format!("{} (Buffer)", zone.name),
            penalty: BUFFER_PENALTY.into(),
            jurisdiction: BUFFER_AUTHORITY.into(),
        }
    }
}

/// Resolve a point against the jurisdiction-code table.
///
/// Always reports a violation: the caller only asks after a change has been
/// confirmed. Unknown codes get the national default.
pub fn check_state_compliance(point: GeoPoint, code: &str) -> LegalVerdict {
    let rule = jurisdiction(code);
    let terms = rule.terms_at(point);
    debug!(code, matched = rule.code, zone = terms.zone, "jurisdiction lookup");
    LegalVerdict {
        is_violation: true,
        law: rule.law.into(),
        article: terms.article.into(),
        section: terms.section.into(),
        severity: terms.severity,
        zone: terms.zone.into(),
        penalty: terms.penalty.into(),
        jurisdiction: rule.authority.into(),
    }
}

impl RuleBook {
    /// Resolve a point against the protected-zone polygons.
    ///
    /// Exact containment is checked over every zone before any buffer ring,
    /// so a point inside one zone and near another reports the zone it is in.
    pub fn check_geo_compliance(&self, point: GeoPoint) -> LegalVerdict {
        if let Some(zone) = self.zone_containing(point) {
            debug!(zone = %zone.name, "point inside protected zone");
            return LegalVerdict::core_zone(zone);
        }
        if let Some(zone) = self.zone_buffering(point) {
            debug!(zone = %zone.name, "point inside buffer ring");
            return LegalVerdict::buffer_zone(zone);
        }
        LegalVerdict::no_violation()
    }

    /// Code lookup when a jurisdiction hint is present, geometry otherwise.
    pub fn resolve(&self, point: GeoPoint, jurisdiction_hint: Option<&str>) -> LegalVerdict {
        match jurisdiction_hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(code) => check_state_compliance(point, code),
            None => self.check_geo_compliance(point),
        }
    }
}
