//! Great-circle distance and coordinate primitives.
//!
//! One canonical Haversine implementation parameterized by [`DistanceUnit`];
//! the miles radius is derived from the kilometre mean radius so the two
//! variants cannot drift apart.

use serde::{Deserialize, Serialize};

/// IUGG mean Earth radius.
const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_MILE: f64 = 1.609_344;

/// A WGS-84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the pair is inside the valid WGS-84 ranges
    /// (`-90 ≤ lat ≤ 90`, `-180 ≤ lng ≤ 180`, both finite).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Unit of length for distance computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    fn earth_radius(self) -> f64 {
        match self {
            Self::Kilometers => EARTH_RADIUS_KM,
            Self::Miles => EARTH_RADIUS_KM / KM_PER_MILE,
        }
    }
}

/// Great-circle distance between two coordinates in the requested unit.
#[must_use]
pub fn haversine_distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * unit.earth_radius() * h.sqrt().asin()
}

/// Whether `point` lies within `radius_miles` great-circle miles of `center`.
#[must_use]
pub fn is_within_radius(point: Coordinate, center: Coordinate, radius_miles: f64) -> bool {
    haversine_distance(point, center, DistanceUnit::Miles) <= radius_miles
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: Coordinate = Coordinate::new(40.7128, -74.0060);
    const LOS_ANGELES: Coordinate = Coordinate::new(34.0522, -118.2437);

    #[test]
    fn haversine_is_symmetric() {
        let forward = haversine_distance(NEW_YORK, LOS_ANGELES, DistanceUnit::Miles);
        let backward = haversine_distance(LOS_ANGELES, NEW_YORK, DistanceUnit::Miles);
        assert!((forward - backward).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // NYC to LA is roughly 2,445 great-circle miles.
        let miles = haversine_distance(NEW_YORK, LOS_ANGELES, DistanceUnit::Miles);
        assert!((miles - 2445.0).abs() < 15.0, "got {miles}");
    }

    #[test]
    fn haversine_units_agree() {
        let miles = haversine_distance(NEW_YORK, LOS_ANGELES, DistanceUnit::Miles);
        let km = haversine_distance(NEW_YORK, LOS_ANGELES, DistanceUnit::Kilometers);
        assert!((miles * KM_PER_MILE - km).abs() < 1e-9, "miles={miles} km={km}");
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        assert_eq!(
            haversine_distance(NEW_YORK, NEW_YORK, DistanceUnit::Kilometers),
            0.0
        );
    }

    #[test]
    fn within_radius_includes_boundary_neighborhood() {
        let center = Coordinate::new(37.7749, -122.4194);
        let nearby = Coordinate::new(37.8044, -122.2712); // Oakland, ~10 mi
        assert!(is_within_radius(nearby, center, 15.0));
        assert!(!is_within_radius(nearby, center, 5.0));
    }

    #[test]
    fn coordinate_validation_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
