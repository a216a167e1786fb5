//! Governance layer: maps a confirmed change at a point to the statute it breaches.
//!
//! Two lookup modes: by jurisdiction code (a fixed table) and by geometry
//! (named protected-zone polygons loaded once at startup).

mod error;
pub use error::RulesError;

pub mod compliance;
pub mod geometry;
pub mod notice;
pub mod statutes;
pub mod zones;

pub use compliance::{LegalVerdict, check_state_compliance};
pub use notice::legal_notice;
pub use statutes::{Statute, ZoneType};
pub use zones::{BUFFER_METRES, ProtectedZone, RuleBook};
