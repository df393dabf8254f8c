use super::Projector;
use crate::geometry::{Cartesian, EPSILON, LonLat, PlanarPoint, clamped_asin};
use crate::stream::Stream;

/// Maximum depth of midpoint subdivision per input segment. Bounds the
/// worst-case cost per segment pair and the recursion stack on pathological
/// inputs such as near-antipodal endpoints with a tight precision demand.
pub const MAX_DEPTH: u32 = 16;

/// cos 30°. Endpoint direction vectors with a smaller dot product are close
/// to antipodal; splitting such a segment is forced so the midpoint chain
/// can settle on one side of the sphere.
const COS_MIN_DISTANCE: f64 = 0.866_025_403_784_438_6;

/// Projects spherical input and, when a positive precision is configured,
/// inserts great-circle midpoints until straight planar interpolation stays
/// within the error bound.
pub enum Resample<J: Projector, S: Stream<PlanarPoint>> {
    Direct(ResampleDirect<J, S>),
    Adaptive(ResampleAdaptive<J, S>),
}

impl<J: Projector, S: Stream<PlanarPoint>> Resample<J, S> {
    /// `delta2` is the squared precision in output units; zero or negative
    /// degenerates to project-and-forward with no subdivision.
    pub fn new(projector: J, delta2: f64, sink: S) -> Self {
        if delta2 > 0.0 {
            Resample::Adaptive(ResampleAdaptive::new(projector, delta2, sink))
        } else {
            Resample::Direct(ResampleDirect { projector, sink })
        }
    }
}

impl<J: Projector, S: Stream<PlanarPoint>> Stream<LonLat> for Resample<J, S> {
    fn point(&mut self, p: LonLat) {
        match self {
            Resample::Direct(stage) => stage.point(p),
            Resample::Adaptive(stage) => stage.point(p),
        }
    }

    fn line_start(&mut self) {
        match self {
            Resample::Direct(stage) => stage.line_start(),
            Resample::Adaptive(stage) => stage.line_start(),
        }
    }

    fn line_end(&mut self) {
        match self {
            Resample::Direct(stage) => stage.line_end(),
            Resample::Adaptive(stage) => stage.line_end(),
        }
    }

    fn polygon_start(&mut self) {
        match self {
            Resample::Direct(stage) => stage.polygon_start(),
            Resample::Adaptive(stage) => stage.polygon_start(),
        }
    }

    fn polygon_end(&mut self) {
        match self {
            Resample::Direct(stage) => stage.polygon_end(),
            Resample::Adaptive(stage) => stage.polygon_end(),
        }
    }

    fn sphere(&mut self) {
        match self {
            Resample::Direct(stage) => stage.sphere(),
            Resample::Adaptive(stage) => stage.sphere(),
        }
    }
}

/// Pure projection, every input point forwarded unchanged.
pub struct ResampleDirect<J: Projector, S: Stream<PlanarPoint>> {
    projector: J,
    sink: S,
}

impl<J: Projector, S: Stream<PlanarPoint>> Stream<LonLat> for ResampleDirect<J, S> {
    fn point(&mut self, p: LonLat) {
        let (x, y) = self.projector.project(p.lon, p.lat);
        self.sink.point(PlanarPoint::new(x, y));
    }

    fn line_start(&mut self) {
        self.sink.line_start();
    }

    fn line_end(&mut self) {
        self.sink.line_end();
    }

    fn polygon_start(&mut self) {
        self.sink.polygon_start();
    }

    fn polygon_end(&mut self) {
        self.sink.polygon_end();
    }

    fn sphere(&mut self) {
        self.sink.sphere();
    }
}

/// One endpoint of the segment under subdivision: projected coordinates,
/// longitude, and the unit direction vector used for curvature checks.
#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    y: f64,
    lon: f64,
    dir: Cartesian,
}

impl Sample {
    fn nan() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            lon: f64::NAN,
            dir: Cartesian::new(f64::NAN, f64::NAN, f64::NAN),
        }
    }
}

/// Which handler the next point event dispatches to; a point can arrive as
/// the first point of a polygon ring, inside a line, or bare.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointContext {
    Default,
    Line,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineContext {
    Default,
    Polygon,
}

pub struct ResampleAdaptive<J: Projector, S: Stream<PlanarPoint>> {
    projector: J,
    delta2: f64,
    sink: S,
    point_context: PointContext,
    line_start_context: LineContext,
    line_end_context: LineContext,
    /// Previous point of the active line; reset at `line_start`.
    prev: Sample,
    /// First point of the active polygon ring, kept to resample the implicit
    /// closing edge at `line_end`.
    ring_start: Sample,
}

impl<J: Projector, S: Stream<PlanarPoint>> ResampleAdaptive<J, S> {
    fn new(projector: J, delta2: f64, sink: S) -> Self {
        Self {
            projector,
            delta2,
            sink,
            point_context: PointContext::Default,
            line_start_context: LineContext::Default,
            line_end_context: LineContext::Default,
            prev: Sample::nan(),
            ring_start: Sample::nan(),
        }
    }

    fn line_start_default(&mut self) {
        self.prev = Sample::nan();
        self.point_context = PointContext::Line;
        self.sink.line_start();
    }

    fn line_end_default(&mut self) {
        self.point_context = PointContext::Default;
        self.sink.line_end();
    }

    fn line_end_polygon(&mut self) {
        self.resample_line_to(self.prev, self.ring_start, MAX_DEPTH);
        // Re-emit the stored first point so the projected ring closes even
        // though the caller streamed the ring open.
        if self.ring_start.x.is_finite() {
            self.sink
                .point(PlanarPoint::new(self.ring_start.x, self.ring_start.y));
        }
        self.line_end_context = LineContext::Default;
        self.line_end_default();
    }

    fn point_default(&mut self, p: LonLat) {
        let (x, y) = self.projector.project(p.lon, p.lat);
        self.sink.point(PlanarPoint::new(x, y));
    }

    fn point_line(&mut self, p: LonLat) {
        let dir = Cartesian::from_spherical(p);
        let (x, y) = self.projector.project(p.lon, p.lat);
        let next = Sample {
            x,
            y,
            lon: p.lon,
            dir,
        };
        self.resample_line_to(self.prev, next, MAX_DEPTH);
        self.prev = next;
        self.sink.point(PlanarPoint::new(x, y));
    }

    /// First point of a ring: same as a line point, but remember it for the
    /// closing edge.
    fn point_polygon(&mut self, p: LonLat) {
        self.point_line(p);
        self.ring_start = self.prev;
        self.point_context = PointContext::Line;
    }

    /// Recursively insert projected great-circle midpoints between `s0` and
    /// `s1` until the planar chord is a faithful stand-in for the curve.
    ///
    /// A segment is accepted as straight when the candidate midpoint's
    /// perpendicular planar offset is within the precision bound, its
    /// projection parameter along the chord is not suspiciously off-center,
    /// and the endpoints are not near-antipodal. NaN anywhere fails every
    /// test, which stops the recursion rather than crashing.
    fn resample_line_to(&mut self, s0: Sample, s1: Sample, depth: u32) {
        let dx = s1.x - s0.x;
        let dy = s1.y - s0.y;
        let d2 = dx * dx + dy * dy;

        if d2 > 4.0 * self.delta2 && depth > 0 {
            let a = s0.dir.x + s1.dir.x;
            let b = s0.dir.y + s1.dir.y;
            let c = s0.dir.z + s1.dir.z;
            let m = (a * a + b * b + c * c).sqrt();
            let cz = c / m;
            let phi2 = clamped_asin(cz);
            // Longitude of the midpoint: the angular mean breaks down for
            // antipodal or longitude-coincident endpoints, where atan2 would
            // see (0, 0); fall back to the arithmetic mean there.
            let lambda2 = if (cz.abs() - 1.0).abs() < EPSILON || (s0.lon - s1.lon).abs() < EPSILON {
                (s0.lon + s1.lon) / 2.0
            } else {
                b.atan2(a)
            };
            let (x2, y2) = self.projector.project(lambda2, phi2);
            let dx2 = x2 - s0.x;
            let dy2 = y2 - s0.y;
            let dz = dy * dx2 - dx * dy2;

            if dz * dz / d2 > self.delta2
                || ((dx * dx2 + dy * dy2) / d2 - 0.5).abs() > 0.3
                || s0.dir.dot(s1.dir) < COS_MIN_DISTANCE
            {
                let mid = Sample {
                    x: x2,
                    y: y2,
                    lon: lambda2,
                    dir: Cartesian::new(a / m, b / m, cz),
                };
                self.resample_line_to(s0, mid, depth - 1);
                self.sink.point(PlanarPoint::new(x2, y2));
                self.resample_line_to(mid, s1, depth - 1);
            }
        }
    }
}

impl<J: Projector, S: Stream<PlanarPoint>> Stream<LonLat> for ResampleAdaptive<J, S> {
    fn point(&mut self, p: LonLat) {
        match self.point_context {
            PointContext::Polygon => self.point_polygon(p),
            PointContext::Line => self.point_line(p),
            PointContext::Default => self.point_default(p),
        }
    }

    fn line_start(&mut self) {
        match self.line_start_context {
            LineContext::Polygon => {
                self.line_start_default();
                self.ring_start = Sample::nan();
                self.point_context = PointContext::Polygon;
                self.line_end_context = LineContext::Polygon;
            }
            LineContext::Default => self.line_start_default(),
        }
    }

    fn line_end(&mut self) {
        match self.line_end_context {
            LineContext::Polygon => self.line_end_polygon(),
            LineContext::Default => self.line_end_default(),
        }
    }

    fn polygon_start(&mut self) {
        self.sink.polygon_start();
        self.line_start_context = LineContext::Polygon;
    }

    fn polygon_end(&mut self) {
        self.sink.polygon_end();
        self.line_start_context = LineContext::Default;
    }

    fn sphere(&mut self) {
        self.sink.sphere();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Equirectangular;
    use crate::stream::recorder::Recorder;

    fn unit_projector() -> Equirectangular {
        Equirectangular {
            scale: 1.0,
            translate: (0.0, 0.0),
        }
    }

    fn run_line(delta2: f64, scale: f64, points: &[(f64, f64)]) -> Vec<PlanarPoint> {
        let projector = Equirectangular {
            scale,
            translate: (0.0, 0.0),
        };
        let mut rec = Recorder::new();
        let mut stage = Resample::new(projector, delta2, &mut rec);
        stage.line_start();
        for &(lon, lat) in points {
            stage.point(LonLat::new(lon, lat));
        }
        stage.line_end();
        drop(stage);
        rec.points()
    }

    #[test]
    fn test_short_segment_not_subdivided() {
        let delta = 1e-6f64;
        let out = run_line(delta * delta, 1.0, &[(0.0, 0.0), (0.001, 0.0)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_long_segment_subdivided() {
        let delta = 1e-6f64;
        let out = run_line(delta * delta, 1.0, &[(0.0, 0.0), (1.0, 0.0)]);
        assert!(out.len() > 2, "expected intermediate points, got {}", out.len());
    }

    #[test]
    fn test_zero_precision_is_pure_projection() {
        let out = run_line(0.0, 100.0, &[(0.0, 0.0), (1.4, 0.7), (0.2, -1.0)]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_smaller_precision_never_emits_fewer_points() {
        let segment = [(0.0, 0.0), (80f64.to_radians(), 40f64.to_radians())];
        let coarse = run_line(1.0, 100.0, &segment);
        let fine = run_line(0.01, 100.0, &segment);
        assert!(coarse.len() > 2, "curved segment should subdivide");
        assert!(fine.len() >= coarse.len());
    }

    #[test]
    fn test_polygon_ring_is_closed() {
        let mut rec = Recorder::new();
        let mut stage = Resample::new(unit_projector(), 0.25, &mut rec);
        stage.polygon_start();
        stage.line_start();
        for &(lon, lat) in &[(0.0, 0.0), (1.2, 0.0), (1.2, 0.9)] {
            stage.point(LonLat::new(lon, lat));
        }
        stage.line_end();
        stage.polygon_end();
        drop(stage);

        let points = rec.points();
        assert!(points.len() >= 4);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert!((first.x - last.x).abs() < EPSILON);
        assert!((first.y - last.y).abs() < EPSILON);
    }

    #[test]
    fn test_near_antipodal_terminates() {
        let delta = 1e-3f64;
        let out = run_line(
            delta * delta,
            1.0,
            &[(1e-9, 0.0), (std::f64::consts::PI - 1e-9, 0.0)],
        );
        // Depth is capped, so the output is large but bounded.
        assert!(!out.is_empty());
        assert!(out.len() <= (1 << 17));
    }

    #[test]
    fn test_nan_input_does_not_hang() {
        let out = run_line(1e-4, 1.0, &[(0.0, 0.0), (f64::NAN, 0.5), (1.0, 0.0)]);
        // NaN propagates; the stage must neither panic nor recurse forever.
        assert!(out.len() >= 3);
    }

    #[test]
    fn test_empty_line_is_tolerated() {
        let out = run_line(0.25, 1.0, &[]);
        assert!(out.is_empty());
    }
}
