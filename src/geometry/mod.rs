//! Core value types shared by every pipeline stage: spherical and planar
//! points, unit direction vectors, and the spherical containment predicate.

mod bounds;
mod cartesian;
mod contains;
mod point;

pub use bounds::Bounds;
pub use cartesian::Cartesian;
pub use contains::polygon_contains;
pub use point::{EPSILON, GeometryError, LonLat, PlanarPoint, Position, StreamPoint};

pub(crate) use cartesian::{clamped_acos, clamped_asin};
pub(crate) use point::{HALF_PI, PI, TAU};
