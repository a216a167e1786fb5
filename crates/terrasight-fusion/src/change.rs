//! Generic change detection over a precomputed deviation.
//!
//! This detector only says that something changed. What kind of violation it
//! is, if any, is the jurisdiction rules' call.

use serde::Serialize;
use terrasight_core::{ChangeWindow, Detection, Severity};

/// Relative deviation above which a change is reported (8%).
pub const CHANGE_THRESHOLD: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSignal {
    pub deviation: f64,
    pub is_violation: bool,
}

impl ChangeSignal {
    pub fn detection(&self) -> Detection {
        if self.is_violation {
            Detection::Positive {
                subtype: "CHANGE".to_string(),
                severity: Severity::Info,
                confidence: 0.99,
                evidence_image_ref: None,
                indicators: vec![format!("DEVIATION_{:.1}_PCT", self.deviation * 100.0)],
            }
        } else {
            Detection::Negative {
                subtype: None,
                confidence: 0.5,
            }
        }
    }
}

pub fn detect_change(window: &ChangeWindow) -> ChangeSignal {
    ChangeSignal {
        deviation: window.deviation,
        is_violation: window.deviation.abs() > CHANGE_THRESHOLD,
    }
}
