//! Vertical card display for verdicts and rule-engine answers.

use std::fmt::Write;

use terrasight_core::{AnchorMode, Verdict};
use terrasight_governance::{LegalVerdict, RuleBook};

const LABEL_WIDTH: usize = 14;

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {label:<width$} {value}", width = LABEL_WIDTH);
}

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n── {title} ──");
}

pub fn verdict_card(verdict: &Verdict) -> String {
    let mut out = String::new();
    header(&mut out, "Verdict");
    row(&mut out, "status", verdict.status.as_str());
    row(&mut out, "message", &verdict.message);
    row(&mut out, "confidence", format!("{:.2}", verdict.confidence));
    if let Some(scene) = &verdict.scene_id {
        row(&mut out, "scene", scene);
    }
    if let Some(terrain) = &verdict.terrain {
        row(
            &mut out,
            "terrain",
            format!("{} ({:.1} dB)", terrain.class.as_str(), terrain.backscatter_db),
        );
    }

    if let Some(v) = &verdict.violation {
        header(&mut out, "Violation");
        row(&mut out, "law", &v.law);
        row(&mut out, "section", &v.section);
        row(&mut out, "article", &v.article);
        row(&mut out, "zone", &v.zone);
        row(&mut out, "severity", v.severity);
        row(&mut out, "penalty", &v.penalty);
        row(&mut out, "jurisdiction", &v.jurisdiction);
    }

    if let Some(anchor) = &verdict.anchor {
        header(&mut out, "Evidence");
        row(&mut out, "fingerprint", &anchor.fingerprint);
        row(&mut out, "digest", &anchor.digest);
        let mode = match &anchor.mode {
            AnchorMode::Ledger { .. } => "ledger",
            AnchorMode::LocalOnly => "local only",
        };
        row(&mut out, "anchored", mode);
        if let Some(image) = &verdict.evidence_image_ref {
            row(&mut out, "image", image);
        }
    }

    if let Some(notice) = &verdict.legal_notice {
        header(&mut out, "Notice");
        for line in notice.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

pub fn legal_card(verdict: &LegalVerdict) -> String {
    let mut out = String::new();
    header(&mut out, "Rule engine");
    row(&mut out, "violation", verdict.is_violation);
    row(&mut out, "law", &verdict.law);
    row(&mut out, "section", &verdict.section);
    row(&mut out, "article", &verdict.article);
    row(&mut out, "zone", &verdict.zone);
    row(&mut out, "severity", verdict.severity);
    row(&mut out, "penalty", &verdict.penalty);
    row(&mut out, "jurisdiction", &verdict.jurisdiction);
    out
}

pub fn zones_table(rules: &RuleBook) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ruleset {} ({} zones)",
        rules.version().unwrap_or("unversioned"),
        rules.zones().len()
    );
    for zone in rules.zones() {
        let _ = writeln!(
            out,
            "  {:<22} {:<8} {:<9} {} ({} polygon{})",
            zone.id.as_deref().unwrap_or("-"),
            zone.zone_type.as_str(),
            zone.severity.as_str(),
            zone.name,
            zone.polygons.len(),
            if zone.polygons.len() == 1 { "" } else { "s" }
        );
    }
    out
}
