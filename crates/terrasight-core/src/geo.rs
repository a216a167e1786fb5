//! WGS-84 coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid coordinates: lat={lat}, lng={lng}")]
pub struct InvalidPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A point in decimal degrees. Latitude first, as the pipeline's callers pass it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point without range checks.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, InvalidPoint> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(InvalidPoint { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_accepts_valid_point() {
        let p = GeoPoint::checked(28.6, 77.25).unwrap();
        assert_eq!(p.lat, 28.6);
        assert_eq!(p.lng, 77.25);
    }

    #[test]
    fn checked_rejects_out_of_range_and_nan() {
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, -180.5).is_err());
        assert!(GeoPoint::checked(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn display_uses_five_decimals() {
        assert_eq!(GeoPoint::new(28.6, 77.25).to_string(), "28.60000, 77.25000");
    }
}
