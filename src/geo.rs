//! Geo
//!
//! Great-circle distances between customer and restaurant coordinates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors raised for unusable coordinates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude or longitude is not finite or outside the WGS-84 range.
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Latitude as supplied
        latitude: f64,
        /// Longitude as supplied
        longitude: f64,
    },

    /// Text that is not a `LAT,LON` pair.
    #[error("expected `LAT,LON`, got {0:?}")]
    Malformed(String),
}

/// Errors raised by a [`DistanceSource`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistanceError {
    /// One of the points could not be used.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// A remote distance provider failed or timed out.
    #[error("distance provider unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, `-90..=90`
    pub latitude: f64,

    /// Longitude, `-180..=180`
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point. Range checks happen when the point is used.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] for NaN, infinite or out of range values.
    pub fn validate(&self) -> Result<(), GeoError> {
        let latitude_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let longitude_ok =
            self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if latitude_ok && longitude_ok {
            Ok(())
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl FromStr for GeoPoint {
    type Err = GeoError;

    /// Parse and validate a `LAT,LON` pair, e.g. `12.9716,77.5946`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GeoError::Malformed(s.to_string());

        let (latitude, longitude) = s.split_once(',').ok_or_else(malformed)?;
        let point = GeoPoint::new(
            latitude.trim().parse().map_err(|_err| malformed())?,
            longitude.trim().parse().map_err(|_err| malformed())?,
        );

        point.validate()?;

        Ok(point)
    }
}

/// Haversine distance between two points in kilometres.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] if either point is invalid.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> Result<f64, GeoError> {
    a.validate()?;
    b.validate()?;

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `h` a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);

    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt()))
}

/// Something that can tell how far apart two points are.
pub trait DistanceSource {
    /// Distance in kilometres from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns a [`DistanceError`] if the distance cannot be determined.
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, DistanceError>;
}

/// Straight-line distance over the Earth's surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl DistanceSource for GreatCircle {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, DistanceError> {
        Ok(distance_km(from, to)?)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const BENGALURU: GeoPoint = GeoPoint::new(12.9716, 77.5946);

    #[test]
    fn points_parse_from_text() -> TestResult {
        assert_eq!("12.9716, 77.5946".parse::<GeoPoint>()?, BENGALURU);
        assert!(matches!("12.9".parse::<GeoPoint>(), Err(GeoError::Malformed(_))));
        assert!(matches!("north,east".parse::<GeoPoint>(), Err(GeoError::Malformed(_))));
        assert!(matches!(
            "95,0".parse::<GeoPoint>(),
            Err(GeoError::InvalidCoordinate { .. })
        ));

        Ok(())
    }
    const MYSURU: GeoPoint = GeoPoint::new(12.2958, 76.6394);

    #[test]
    fn same_point_is_zero() -> TestResult {
        assert!(distance_km(BENGALURU, BENGALURU)?.abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn distance_is_symmetric() -> TestResult {
        let there = distance_km(BENGALURU, MYSURU)?;
        let back = distance_km(MYSURU, BENGALURU)?;

        assert!((there - back).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn bengaluru_to_mysuru_is_about_128_km() -> TestResult {
        let km = distance_km(BENGALURU, MYSURU)?;

        assert!((127.0..129.0).contains(&km), "got {km}");

        Ok(())
    }

    #[test]
    fn one_degree_of_latitude() -> TestResult {
        let km = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0))?;

        assert!((km - 111.195).abs() < 0.01, "got {km}");

        Ok(())
    }

    #[test]
    fn antipodes_are_half_the_circumference() -> TestResult {
        let km = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0))?;

        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn nan_coordinate_is_rejected() {
        let result = distance_km(GeoPoint::new(f64::NAN, 0.0), BENGALURU);

        assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(distance_km(BENGALURU, GeoPoint::new(91.0, 0.0)).is_err());
        assert!(distance_km(BENGALURU, GeoPoint::new(0.0, -180.5)).is_err());
        assert!(distance_km(GeoPoint::new(0.0, f64::INFINITY), BENGALURU).is_err());
    }

    #[test]
    fn great_circle_source_wraps_geo_errors() {
        let result = GreatCircle.distance_km(GeoPoint::new(100.0, 0.0), BENGALURU);

        assert!(matches!(
            result,
            Err(DistanceError::Geo(GeoError::InvalidCoordinate { .. }))
        ));
    }
}
