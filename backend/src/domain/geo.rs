//! Service-area geometry and geofence validation.
//!
//! Zones are circles over a planar approximation: the longitude delta is
//! projected by the cosine of the latitude to account for meridian
//! convergence, both deltas are scaled to kilometres per degree, and the
//! Euclidean norm is compared against the zone radius. This is accurate at
//! city scale and deliberately NOT a great-circle distance; do not reuse it
//! for country-scale spans.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Error;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.11;

/// Zone radii are configured in miles; the comparison happens in kilometres.
const MILES_TO_KM: f64 = 1.6;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point from latitude/longitude degrees.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A circular service zone rides may start and end in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceZone {
    /// Operator-facing zone name.
    pub name: String,
    /// Zone centre.
    pub center: GeoPoint,
    /// Zone radius in miles.
    pub radius_miles: f64,
}

impl ServiceZone {
    /// Build a zone from a centre point and a radius in miles.
    #[must_use]
    pub fn new(name: impl Into<String>, center: GeoPoint, radius_miles: f64) -> Self {
        Self {
            name: name.into(),
            center,
            radius_miles,
        }
    }

    /// Whether `point` falls inside this zone under the planar approximation.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        planar_distance_km(self.center, point) <= self.radius_miles * MILES_TO_KM
    }
}

/// Planar-approximated distance between two points in kilometres.
#[must_use]
pub fn planar_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_delta_km = (a.latitude - b.latitude) * KM_PER_DEGREE;
    let lng_delta_km =
        (a.longitude - b.longitude) * a.latitude.to_radians().cos() * KM_PER_DEGREE;
    lat_delta_km.hypot(lng_delta_km)
}

/// Whether `point` lies inside at least one of `zones`.
#[must_use]
pub fn is_inside_service_area(point: GeoPoint, zones: &[ServiceZone]) -> bool {
    zones.iter().any(|zone| zone.contains(point))
}

/// Validate that a route starts and ends inside the service area.
///
/// The start and end may sit in different zones; each endpoint only needs one
/// covering zone of its own.
pub fn validate_route(start: GeoPoint, end: GeoPoint, zones: &[ServiceZone]) -> Result<(), Error> {
    if !is_inside_service_area(start, zones) {
        return Err(out_of_service_area("pickup"));
    }
    if !is_inside_service_area(end, zones) {
        return Err(out_of_service_area("drop-off"));
    }
    Ok(())
}

fn out_of_service_area(endpoint: &str) -> Error {
    Error::invalid_request(format!("{endpoint} point is outside the service area"))
        .with_details(json!({ "code": "out_of_service_area", "endpoint": endpoint }))
}
