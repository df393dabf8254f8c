//! Projection strategies and the pipeline that applies them: spherical
//! clipping, adaptive resampling, and projection compose into one owned
//! chain of stream stages per geometry.

mod conic_equal_area;
mod equirectangular;
mod resample;

pub use conic_equal_area::ConicEqualArea;
pub use equirectangular::Equirectangular;
pub use resample::{MAX_DEPTH, Resample, ResampleAdaptive, ResampleDirect};

use crate::clip::{AntimeridianClip, CircleClip, ClipStage};
use crate::geometry::{LonLat, PlanarPoint};
use crate::stream::{Geometry, Stream};

/// A pluggable projection formula.
///
/// The pipeline treats it as opaque: spherical radians in, planar output
/// units out. `invert` is optional and only used by interactive features
/// (hit-testing back to the sphere).
pub trait Projector {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64);

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let _ = (x, y);
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum PreClip {
    Antimeridian,
    Circle(f64),
}

/// A configured projection: projector strategy, pre-clip boundary and
/// resampling precision.
///
/// `stream` assembles a fresh stage chain per call; chains own all their
/// per-line state, so independent geometries may be processed concurrently
/// as long as each uses its own chain.
#[derive(Debug, Clone)]
pub struct Projection<J: Projector> {
    projector: J,
    delta2: f64,
    clip: PreClip,
}

impl<J: Projector + Clone> Projection<J> {
    pub fn new(projector: J) -> Self {
        Self {
            projector,
            delta2: 0.5,
            clip: PreClip::Antimeridian,
        }
    }

    /// Set the resampling precision δ, in output units. Values at or below
    /// zero disable adaptive subdivision entirely.
    pub fn precision(mut self, delta: f64) -> Self {
        self.delta2 = if delta > 0.0 { delta * delta } else { 0.0 };
        self
    }

    /// Clip to the small circle of the given angular radius (degrees)
    /// around the projection center instead of the antimeridian.
    pub fn clip_angle(mut self, degrees: f64) -> Self {
        self.clip = PreClip::Circle(degrees.to_radians());
        self
    }

    /// Restore the default antimeridian cut.
    pub fn clip_antimeridian(mut self) -> Self {
        self.clip = PreClip::Antimeridian;
        self
    }

    /// Build the stage chain ending in `sink`. Input events are spherical
    /// radians; pass `&mut sink` to keep ownership of a terminal consumer.
    pub fn stream<S: Stream<PlanarPoint>>(&self, sink: S) -> ProjectionPipeline<J, S> {
        let resample = Resample::new(self.projector.clone(), self.delta2, sink);
        match self.clip {
            PreClip::Antimeridian => {
                ProjectionPipeline::Antimeridian(ClipStage::new(AntimeridianClip, resample))
            }
            PreClip::Circle(radius) => {
                ProjectionPipeline::Circle(ClipStage::new(CircleClip::new(radius), resample))
            }
        }
    }

    /// Project a whole geometry into a terminal consumer.
    pub fn render<S: Stream<PlanarPoint>>(&self, geometry: &Geometry, sink: &mut S) {
        let mut pipeline = self.stream(sink);
        geometry.stream_to(&mut pipeline);
    }
}

/// The assembled chain: pre-clip into resampling into the sink.
pub enum ProjectionPipeline<J: Projector, S: Stream<PlanarPoint>> {
    Antimeridian(ClipStage<AntimeridianClip, Resample<J, S>>),
    Circle(ClipStage<CircleClip, Resample<J, S>>),
}

impl<J: Projector, S: Stream<PlanarPoint>> Stream<LonLat> for ProjectionPipeline<J, S> {
    fn point(&mut self, p: LonLat) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.point(p),
            ProjectionPipeline::Circle(stage) => stage.point(p),
        }
    }

    fn line_start(&mut self) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.line_start(),
            ProjectionPipeline::Circle(stage) => stage.line_start(),
        }
    }

    fn line_end(&mut self) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.line_end(),
            ProjectionPipeline::Circle(stage) => stage.line_end(),
        }
    }

    fn polygon_start(&mut self) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.polygon_start(),
            ProjectionPipeline::Circle(stage) => stage.polygon_start(),
        }
    }

    fn polygon_end(&mut self) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.polygon_end(),
            ProjectionPipeline::Circle(stage) => stage.polygon_end(),
        }
    }

    fn sphere(&mut self) {
        match self {
            ProjectionPipeline::Antimeridian(stage) => stage.sphere(),
            ProjectionPipeline::Circle(stage) => stage.sphere(),
        }
    }
}
