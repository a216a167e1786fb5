//! Plain-text notice of violation.

use chrono::{DateTime, Utc};
use terrasight_core::GeoPoint;

use crate::compliance::LegalVerdict;

/// Render the notice served for a violation. `None` when nothing was breached.
pub fn legal_notice(verdict: &LegalVerdict, point: GeoPoint, timestamp: DateTime<Utc>) -> Option<String> {
    if !verdict.is_violation {
        return None;
    }

    let mut out = String::new();
    out.push_str("NOTICE OF ENVIRONMENTAL VIOLATION\n");
    out.push_str(&format!("Issued under: {}\n", verdict.law));
    out.push_str(&format!("Date: {}\n\n", timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push_str(&format!(
        "Satellite surveillance has detected an unauthorised change in land use at \
         coordinates {point}, within {}.\n\n",
        verdict.zone
    ));
    out.push_str(&format!("Provision: {}, {}\n", verdict.section, verdict.article));
    out.push_str(&format!("Severity: {}\n", verdict.severity.as_str()));
    out.push_str(&format!("Proposed action: {}\n", verdict.penalty));
    out.push_str(&format!("Forum: {}\n\n", verdict.jurisdiction));
    out.push_str(
        "The occupier is directed to halt all activity at the site and show cause \
         why the proposed action should not be taken.\n",
    );
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_state_compliance;
    use chrono::TimeZone;

    #[test]
    fn notice_for_violation() {
        let point = GeoPoint::new(28.6, 77.25);
        let verdict = check_state_compliance(point, "DELHI");
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        let text = legal_notice(&verdict, point, ts).unwrap();
        assert!(text.contains("Delhi Land Reforms Act, 1954"));
        assert!(text.contains("28.60000, 77.25000"));
        assert!(text.contains("Yamuna Floodplain (Okhla)"));
        assert!(text.contains("Immediate Demolition & Fine"));
        assert!(text.contains("2025-03-01 10:30:00 UTC"));
        assert!(text.contains("Severity: CRITICAL"));
    }

    #[test]
    fn no_notice_without_violation() {
        let verdict = LegalVerdict::no_violation();
        assert!(legal_notice(&verdict, GeoPoint::new(0.0, 0.0), Utc::now()).is_none());
    }
}
