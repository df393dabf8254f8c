//! geostream - Streaming spherical-to-planar projection pipeline for vector
//! maps.
//!
//! Geometry flows one way through owned, composed stages that all speak the
//! same event protocol: spherical input is clipped against a boundary
//! (antimeridian or projection horizon), adaptively resampled so projected
//! great-circle segments stay within a precision bound, and handed to any
//! terminal consumer of planar events.
//!
//! The whole pipeline is synchronous and CPU-bound; a chain must not be
//! shared across threads mid-geometry, but independent chains are fully
//! independent.

pub mod clip;
pub mod geometry;
pub mod projection;
pub mod stream;

pub use geometry::{
    Bounds, EPSILON, GeometryError, LonLat, PlanarPoint, Position, polygon_contains,
};
pub use projection::{ConicEqualArea, Equirectangular, Projection, Projector};
pub use stream::{Geometry, Stream};
