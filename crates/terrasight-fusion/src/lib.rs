//! Fusion layer: pure classifiers over one [`FusedScene`](terrasight_core::FusedScene).
//!
//! Every detector is an ordered rule list evaluated top to bottom; the first
//! rule whose condition holds decides the outcome.

pub mod change;
pub mod deforestation;
pub mod mining;
pub mod rules;
pub mod terrain;

pub use change::{CHANGE_THRESHOLD, ChangeSignal, detect_change};
pub use deforestation::{
    DEFAULT_BASELINE_NDVI, DeforestationKind, DeforestationReport, analyze_deforestation,
};
pub use mining::{MiningIndicator, MiningKind, MiningReport, detect_illegal_mining};
pub use rules::{OrderedRule, first_match};
pub use terrain::classify_terrain;
