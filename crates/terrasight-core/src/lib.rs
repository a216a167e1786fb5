pub mod detection;
pub mod geo;
pub mod hex;
pub mod record;
pub mod scene;
pub mod verdict;

pub use detection::{Detection, Severity, TerrainAssessment, TerrainClass};
pub use geo::{GeoPoint, InvalidPoint};
pub use hex::{hex_decode, hex_encode};
pub use record::DetectionRecord;
pub use scene::{ChangeWindow, EvidenceImage, FusedScene, SensorKind, SensorReading};
pub use verdict::{AnchorMode, AnchorRecord, Verdict, VerdictStatus, Violation};
