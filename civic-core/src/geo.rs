//! Great-circle distance helpers for the proximity query.
//!
//! The proximity search is a linear scan: every complaint with coordinates is
//! measured against the query point. There is no spatial index.

use crate::{Complaint, ValidationError};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius applied when a proximity query omits one.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        check_coordinate("latitude", latitude, 90.0)?;
        check_coordinate("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Combine optional coordinates; exactly one being present is an error.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ValidationError::RequiredFieldMissing {
                field: "longitude".to_string(),
            }),
            (None, Some(_)) => Err(ValidationError::RequiredFieldMissing {
                field: "latitude".to_string(),
            }),
        }
    }

    /// Haversine distance to another point in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

fn check_coordinate(field: &str, value: f64, bound: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < -bound || value > bound {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: format!("{}", -bound),
            max: format!("{}", bound),
        });
    }
    Ok(())
}

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Validate a search radius. Negative, NaN and infinite radii are rejected.
pub fn validate_radius(radius_km: f64) -> Result<f64, ValidationError> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "radius".to_string(),
            reason: "must be a non-negative number of kilometres".to_string(),
        });
    }
    Ok(radius_km)
}

/// Keep the complaints whose location lies within `radius_km` of `center`.
///
/// Complaints without coordinates are skipped. Result order follows input order.
pub fn within_radius<'a, I>(complaints: I, center: &GeoPoint, radius_km: f64) -> Vec<Complaint>
where
    I: IntoIterator<Item = &'a Complaint>,
{
    complaints
        .into_iter()
        .filter(|c| {
            c.location
                .map(|loc| loc.distance_km(center) <= radius_km)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
