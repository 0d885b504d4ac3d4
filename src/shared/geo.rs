use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Radius of the reference sphere in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// A geographic point on the reference sphere, in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

impl Coordinate {
    /// Great-circle distance in meters by the spherical law of cosines.
    pub fn distance(&self, other: &Self) -> f64 {
        let from_lat = self.latitude.to_radians();
        let to_lat = other.latitude.to_radians();
        let delta = (self.longitude - other.longitude).abs().to_radians();
        let cosine = from_lat.sin() * to_lat.sin() + from_lat.cos() * to_lat.cos() * delta.cos();
        // Rounding can push the cosine a hair above 1.0 for coincident
        // points, and acos of that is NaN.
        cosine.clamp(-1.0, 1.0).acos() * EARTH_RADIUS
    }
}

#[test]
fn distance_test() {
    let coord_a = Coordinate {
        latitude: 55.611087,
        longitude: 37.208290,
    };

    let coord_b = Coordinate {
        latitude: 55.595884,
        longitude: 37.209755,
    };
    let d = coord_a.distance(&coord_b);
    assert!((d - 1693.0).abs() < 1.0);
}

#[test]
fn distance_same_point_test() {
    let coord = Coordinate {
        latitude: 55.611087,
        longitude: 37.208290,
    };
    assert_eq!(coord.distance(&coord), 0.0);
}

#[test]
fn distance_antipodal_not_nan_test() {
    let coord_a = Coordinate {
        latitude: 0.0,
        longitude: 0.0,
    };
    let coord_b = Coordinate {
        latitude: 0.0,
        longitude: 180.0,
    };
    let d = coord_a.distance(&coord_b);
    assert!(d.is_finite());
    assert!((d - std::f64::consts::PI * EARTH_RADIUS).abs() < 1.0);
}
