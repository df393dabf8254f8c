use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared tolerance for point and angle equality, in radians.
///
/// Trigonometric round-trips never reproduce bit-identical values, so every
/// stage compares coordinates against this single constant. The resampler,
/// the rejoin engine and the containment predicate must all agree on it or
/// ring closure and crossing pairing fall apart.
pub const EPSILON: f64 = 1e-6;

pub(crate) const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;
pub(crate) const QUARTER_PI: f64 = std::f64::consts::FRAC_PI_4;
pub(crate) const PI: f64 = std::f64::consts::PI;
pub(crate) const TAU: f64 = std::f64::consts::TAU;

/// A spherical point in radians on the unit sphere.
///
/// Longitude grows eastward, latitude northward. All pipeline-internal
/// angles are radians; degree input enters through [`Position`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A projected point in output-device units.
///
/// `z` is an opaque tag carried through planar stages unchanged (useful for
/// z-ordering downstream); no stage uses it geometrically. Stages that
/// synthesize points emit `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Epsilon-based equality for the point types that flow through a stream.
///
/// Returns false when any coordinate is NaN, so degenerate points never
/// count as coincident.
pub trait StreamPoint: Copy {
    fn nearly_equal(&self, other: &Self) -> bool;
}

impl StreamPoint for LonLat {
    fn nearly_equal(&self, other: &Self) -> bool {
        (self.lon - other.lon).abs() < EPSILON && (self.lat - other.lat).abs() < EPSILON
    }
}

impl StreamPoint for PlanarPoint {
    fn nearly_equal(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

/// Coordinate validation failures at the pipeline boundary.
///
/// Inside the pipeline NaN propagates silently by design; rejection happens
/// only here, where user-supplied degree coordinates come in.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("latitude {0} is outside [-90, 90] degrees")]
    LatitudeOutOfRange(f64),
    #[error("coordinate is not a finite number")]
    NonFiniteCoordinate,
}

/// A user-facing coordinate in degrees, GeoJSON axis order (longitude first).
///
/// Serializes as a two-element array `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    /// Validate and build a position.
    ///
    /// # Arguments
    /// * `lon` - longitude in degrees (any finite value; ±180 wraps are
    ///   handled downstream by the antimeridian clipper)
    /// * `lat` - latitude in degrees, must be within [-90, 90]
    pub fn new(lon: f64, lat: f64) -> Result<Self, GeometryError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeometryError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lon, lat })
    }

    /// Convert to the radian representation used by the pipeline.
    ///
    /// Longitude is wrapped into [-π, π); the clip stages assume normalized
    /// longitudes, so a coordinate given as 200° enters the pipeline
    /// as -160°.
    pub fn radians(self) -> LonLat {
        let lon = (self.lon.to_radians() + PI).rem_euclid(TAU) - PI;
        LonLat::new(lon, self.lat.to_radians())
    }
}

impl TryFrom<[f64; 2]> for Position {
    type Error = GeometryError;

    fn try_from(value: [f64; 2]) -> Result<Self, Self::Error> {
        Position::new(value[0], value[1])
    }
}

impl From<Position> for [f64; 2] {
    fn from(value: Position) -> Self {
        [value.lon, value.lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearly_equal_within_epsilon() {
        let a = LonLat::new(1.0, 0.5);
        let b = LonLat::new(1.0 + 1e-9, 0.5 - 1e-9);
        assert!(a.nearly_equal(&b));
        let c = LonLat::new(1.0 + 1e-3, 0.5);
        assert!(!a.nearly_equal(&c));
    }

    #[test]
    fn test_nearly_equal_nan_is_never_equal() {
        let a = LonLat::new(f64::NAN, 0.0);
        assert!(!a.nearly_equal(&a));
    }

    #[test]
    fn test_position_rejects_bad_latitude() {
        assert_eq!(
            Position::new(0.0, 91.0),
            Err(GeometryError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Position::new(f64::NAN, 0.0),
            Err(GeometryError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn test_position_radians() {
        let p = Position::new(90.0, -90.0).unwrap().radians();
        assert!((p.lon - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((p.lat + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_position_longitude_wraps() {
        let p = Position::new(200.0, 0.0).unwrap().radians();
        assert!((p.lon + 160f64.to_radians()).abs() < 1e-12);
        // Both antimeridian spellings land on the same normalized value.
        let a = Position::new(180.0, 0.0).unwrap().radians();
        let b = Position::new(-180.0, 0.0).unwrap().radians();
        assert!((a.lon - b.lon).abs() < 1e-12);
    }

    #[test]
    fn test_position_serde_array_form() {
        let p: Position = serde_json::from_str("[12.5, -33.0]").unwrap();
        assert_eq!(p, Position::new(12.5, -33.0).unwrap());
        assert_eq!(serde_json::to_string(&p).unwrap(), "[12.5,-33.0]");

        let bad: Result<Position, _> = serde_json::from_str("[0.0, 120.0]");
        assert!(bad.is_err());
    }
}
