//! Spherical geometry helpers.
use serde::{Deserialize, Serialize};

/// Weight of the first point in [`midpoint`].
pub const FIRST_WEIGHT: f64 = 1.0;
/// Weight of the second point in [`midpoint`].
pub const SECOND_WEIGHT: f64 = 2.0;

const DEGENERATE_NORM: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn to_cartesian(self) -> [f64; 3] {
        let (lat, lon) = (self.lat.to_radians(), self.lon.to_radians());
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

/// Weighted center of two points on the unit sphere, `first` weighted 1 and `second` weighted 2.
///
/// The result leans towards `second`, so this is not the geometric midpoint.
pub fn midpoint(first: LatLon, second: LatLon) -> LatLon {
    weighted_center(first, FIRST_WEIGHT, second, SECOND_WEIGHT)
}

/// Turns both points into unit vectors, averages them with the given weights and
/// projects the result back onto latitude/longitude.
///
/// When the averaged vector vanishes (antipodal points with equal weights) there is no
/// defined direction and `(0, 0)` is returned.
pub fn weighted_center(first: LatLon, first_weight: f64, second: LatLon, second_weight: f64) -> LatLon {
    let a = first.to_cartesian();
    let b = second.to_cartesian();
    let total = first_weight + second_weight;

    let [x, y, z] = [0usize, 1, 2].map(|i| (a[i] * first_weight + b[i] * second_weight) / total);

    if x.hypot(y).hypot(z) < DEGENERATE_NORM {
        return LatLon::new(0.0, 0.0);
    }

    let lon = y.atan2(x);
    let lat = z.atan2(x.hypot(y));
    LatLon::new(lat.to_degrees(), lon.to_degrees())
}
