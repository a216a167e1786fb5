//! Planar point-in-polygon and point-to-boundary distance.
//!
//! Positions follow GeoJSON order, `[lng, lat]`. Distances use a local
//! equirectangular projection centred on the query point, which is accurate
//! to well under a metre at buffer scale (hundreds of metres).

use terrasight_core::GeoPoint;

/// Mean Earth radius (IUGG), metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Points this close to a ring edge count as on the boundary.
const ON_BOUNDARY_M: f64 = 0.01;

/// A polygon: one exterior ring and zero or more holes.
///
/// Rings are closed (first position equals last) and hold at least four positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<[f64; 2]>,
    pub holes: Vec<Vec<[f64; 2]>>,
}

impl Polygon {
    /// Build from GeoJSON rings: the first ring is the exterior.
    ///
    /// Returns `None` when there is no exterior ring.
    pub fn from_rings(mut rings: Vec<Vec<[f64; 2]>>) -> Option<Self> {
        if rings.is_empty() {
            return None;
        }
        let exterior = rings.remove(0);
        Some(Self {
            exterior,
            holes: rings,
        })
    }

    pub fn rings(&self) -> impl Iterator<Item = &[[f64; 2]]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Exact containment: inside the exterior and outside every hole.
    /// Points on any ring boundary, vertices included, are contained.
    pub fn contains(&self, point: GeoPoint) -> bool {
        if self.boundary_distance_m(point) <= ON_BOUNDARY_M {
            return true;
        }
        ring_contains(&self.exterior, point) && !self.holes.iter().any(|h| ring_contains(h, point))
    }

    /// Shortest distance in metres from `point` to any ring edge.
    pub fn boundary_distance_m(&self, point: GeoPoint) -> f64 {
        self.rings()
            .map(|ring| ring_distance_m(ring, point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Containment in the polygon grown outward by `buffer_m` metres.
    pub fn buffered_contains(&self, point: GeoPoint, buffer_m: f64) -> bool {
        self.contains(point) || self.boundary_distance_m(point) <= buffer_m
    }
}

/// Even-odd ray casting.
fn ring_contains(ring: &[[f64; 2]], point: GeoPoint) -> bool {
    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn ring_distance_m(ring: &[[f64; 2]], point: GeoPoint) -> f64 {
    let metres_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let lng_scale = point.lat.to_radians().cos() * metres_per_degree;

    // Project into metres relative to the query point, which becomes the origin.
    let project = |p: &[f64; 2]| -> (f64, f64) {
        ((p[0] - point.lng) * lng_scale, (p[1] - point.lat) * metres_per_degree)
    };

    ring.windows(2)
        .map(|edge| origin_to_segment(project(&edge[0]), project(&edge[1])))
        .fold(f64::INFINITY, f64::min)
}

fn origin_to_segment(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (-(a.0 * dx + a.1 * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (cx * cx + cy * cy).sqrt()
}
