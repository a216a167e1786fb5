//! Material classification from SAR backscatter.
//!
//! Concrete and metal return strong double-bounce echoes; soil, water and
//! canopy return weak ones.

use terrasight_core::{TerrainAssessment, TerrainClass};

/// At or above this level (dB) the surface is classed as metal/concrete.
pub const METAL_CONCRETE_DB: f64 = -6.0;
/// Above this level (dB) and below [`METAL_CONCRETE_DB`] the surface is dense urban.
pub const DENSE_URBAN_DB: f64 = -10.0;

/// Classify a backscatter value. Total: every finite or non-finite input gets a class.
pub fn classify_terrain(backscatter_db: f64) -> TerrainAssessment {
    let (class, confidence) = if backscatter_db >= METAL_CONCRETE_DB {
        (TerrainClass::MetalConcrete, 0.99)
    } else if backscatter_db > DENSE_URBAN_DB {
        (TerrainClass::DenseUrban, 0.95)
    } else {
        (TerrainClass::VegetationOrSoil, 0.40)
    };

    TerrainAssessment {
        class,
        confidence,
        backscatter_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_backscatter_is_metal_concrete() {
        let t = classify_terrain(-5.0);
        assert_eq!(t.class, TerrainClass::MetalConcrete);
        assert_eq!(t.confidence, 0.99);
        assert!(t.class.is_man_made());
    }

    #[test]
    fn minus_six_is_inclusive() {
        assert_eq!(classify_terrain(-6.0).class, TerrainClass::MetalConcrete);
        assert_eq!(classify_terrain(-6.01).class, TerrainClass::DenseUrban);
    }

    #[test]
    fn moderate_backscatter_is_dense_urban() {
        let t = classify_terrain(-8.0);
        assert_eq!(t.class, TerrainClass::DenseUrban);
        assert_eq!(t.confidence, 0.95);
    }

    #[test]
    fn minus_ten_is_vegetation() {
        let t = classify_terrain(-10.0);
        assert_eq!(t.class, TerrainClass::VegetationOrSoil);
        assert_eq!(t.confidence, 0.40);
        assert!(!t.class.is_man_made());
    }

    #[test]
    fn deterministic() {
        for db in [-25.0, -12.5, -9.99, -6.0, -0.5] {
            assert_eq!(classify_terrain(db), classify_terrain(db));
        }
    }
}
