//! Route geometry: road-corrected distances between GPS points and the
//! travel-time estimates derived from them.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier approximating road distance over straight-line distance.
const ROAD_CORRECTION: f64 = 1.25;

/// A latitude/longitude pair in degrees. Plain value type, copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Road distance between two points in km, rounded to two decimals.
///
/// Great-circle distance scaled by the road-correction factor; identical
/// points yield exactly 0.0.
pub fn road_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let corrected = haversine_km(p1, p2) * ROAD_CORRECTION;
    (corrected * 100.0).round() / 100.0
}

// Haversine distance between two GPS coordinates (returns km)
fn haversine_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + p1.latitude.to_radians().cos()
            * p2.latitude.to_radians().cos()
            * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Travel time for a route leg, or the sentinel when no estimate is
/// possible (unknown position, or a speed that would divide by zero).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelEstimate {
    Minutes(f64),
    Indeterminate,
}

/// Minutes to cover `distance_km` at `speed_kmh`. A speed of zero or less,
/// or a degenerate distance, yields `Indeterminate` instead of dividing.
pub fn estimated_travel_time(distance_km: f64, speed_kmh: f64) -> TravelEstimate {
    if speed_kmh <= 0.0 || !distance_km.is_finite() {
        return TravelEstimate::Indeterminate;
    }
    TravelEstimate::Minutes(distance_km / speed_kmh * 60.0)
}

impl fmt::Display for TravelEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelEstimate::Minutes(minutes) => write!(f, "{:.1} min", minutes),
            TravelEstimate::Indeterminate => f.write_str("Indefinido"),
        }
    }
}

impl Serialize for TravelEstimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FCA: GeoPoint = GeoPoint::new(-22.5565835, -47.4216307);
    const RODEIO: GeoPoint = GeoPoint::new(-22.619852, -47.377685);

    #[test]
    fn identical_points_are_zero_distance() {
        assert_eq!(road_distance(FCA, FCA), 0.0);
        assert_eq!(road_distance(RODEIO, RODEIO), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(road_distance(FCA, RODEIO), road_distance(RODEIO, FCA));
    }

    #[test]
    fn full_route_matches_corrected_haversine() {
        // Great-circle distance is 8.3575 km; the 1.25 correction and
        // two-decimal rounding give 10.45.
        assert_eq!(road_distance(FCA, RODEIO), 10.45);
    }

    #[test]
    fn distance_is_two_decimals_and_non_negative() {
        let mid = GeoPoint::new(-22.58, -47.40);
        for d in [
            road_distance(mid, FCA),
            road_distance(mid, RODEIO),
            road_distance(FCA, RODEIO),
        ] {
            assert!(d >= 0.0);
            assert_eq!(d, (d * 100.0).round() / 100.0);
        }
        assert_eq!(road_distance(mid, FCA), 4.28);
        assert_eq!(road_distance(mid, RODEIO), 6.24);
    }

    #[test]
    fn travel_time_refuses_zero_or_negative_speed() {
        assert_eq!(
            estimated_travel_time(10.45, 0.0),
            TravelEstimate::Indeterminate
        );
        assert_eq!(
            estimated_travel_time(10.45, -3.0),
            TravelEstimate::Indeterminate
        );
        assert_eq!(
            estimated_travel_time(f64::NAN, 40.0),
            TravelEstimate::Indeterminate
        );
    }

    #[test]
    fn travel_time_grows_with_distance_and_shrinks_with_speed() {
        assert_eq!(
            estimated_travel_time(20.0, 40.0),
            TravelEstimate::Minutes(30.0)
        );
        assert_eq!(
            estimated_travel_time(30.0, 40.0),
            TravelEstimate::Minutes(45.0)
        );
        assert_eq!(
            estimated_travel_time(20.0, 80.0),
            TravelEstimate::Minutes(15.0)
        );
        match estimated_travel_time(10.45, 37.0) {
            TravelEstimate::Minutes(minutes) => {
                assert_relative_eq!(minutes, 16.945945945945947, epsilon = 1e-9);
            }
            TravelEstimate::Indeterminate => panic!("expected an estimate"),
        }
    }

    #[test]
    fn travel_time_renders_for_humans() {
        assert_eq!(estimated_travel_time(8.26, 40.0).to_string(), "12.4 min");
        assert_eq!(TravelEstimate::Indeterminate.to_string(), "Indefinido");
        assert_eq!(
            serde_json::to_value(estimated_travel_time(20.0, 40.0)).unwrap(),
            serde_json::Value::String("30.0 min".to_string())
        );
    }
}
