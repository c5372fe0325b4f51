use ::geo::{Distance, HaversineMeasure, Point};

use crate::{CoreError, GeoPoint};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn to_point(point: GeoPoint) -> Point<f64> {
    Point::new(point.lng, point.lat)
}

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_M).distance(to_point(from), to_point(to)) / 1000.0
}

pub(crate) fn validate_point(point: GeoPoint) -> Result<(), CoreError> {
    if !point.lat.is_finite() || !(-90.0..=90.0).contains(&point.lat) {
        return Err(CoreError::invalid(format!(
            "latitude {} is outside [-90, 90]",
            point.lat
        )));
    }
    if !point.lng.is_finite() || !(-180.0..=180.0).contains(&point.lng) {
        return Err(CoreError::invalid(format!(
            "longitude {} is outside [-180, 180]",
            point.lng
        )));
    }
    Ok(())
}
