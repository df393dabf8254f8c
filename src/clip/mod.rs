//! Clipping stages: a per-boundary line clipper strategy ([`Clipper`]), the
//! generic polygon clip stage that drives it ([`ClipStage`]), and the rejoin
//! engine that stitches visible fragments back into rings.

mod antimeridian;
mod buffer;
mod circle;
mod rejoin;

use std::cmp::Ordering;

pub use antimeridian::{AntimeridianClip, AntimeridianLine};
pub use circle::{CircleClip, CircleLine};
pub use rejoin::rejoin;

pub(crate) use buffer::LineBuffer;

use crate::geometry::{EPSILON, HALF_PI, LonLat, polygon_contains};
use crate::stream::Stream;

/// Line-clipper report: the line produced no boundary crossings.
pub const CLEAN_NO_CROSSINGS: u8 = 1;
/// Line-clipper report: the line started and ended inside the clip region,
/// so its first and last visible fragments belong to the same output ring.
pub const CLEAN_REJOIN_FIRST_LAST: u8 = 2;

/// A clip-boundary strategy over spherical points.
///
/// The per-line state machine receives points one at a time and forwards
/// visible fragments to `sink`, breaking lines at boundary crossings;
/// `clean` summarizes what the last line did. `interpolate` draws the
/// boundary arc between two crossings in the given direction, or the whole
/// boundary when no crossings are supplied.
pub trait Clipper {
    type Line;

    /// Fresh per-line clipping state.
    fn line(&self) -> Self::Line;

    fn point_visible(&self, p: LonLat) -> bool;

    fn line_start(&self, line: &mut Self::Line, sink: &mut dyn Stream<LonLat>);
    fn line_point(&self, line: &mut Self::Line, p: LonLat, sink: &mut dyn Stream<LonLat>);
    fn line_end(&self, line: &mut Self::Line, sink: &mut dyn Stream<LonLat>);

    /// Flags for the line most recently finished on `line`.
    fn clean(&self, line: &Self::Line) -> u8;

    fn interpolate(
        &self,
        from: Option<LonLat>,
        to: Option<LonLat>,
        direction: i32,
        sink: &mut dyn Stream<LonLat>,
    );

    /// A fixed point on the clip boundary; the containment test against the
    /// subject polygon is seeded here.
    fn start(&self) -> LonLat;
}

/// Total order over boundary crossing points, shared by the spherical
/// clippers so entry and exit flags alternate consistently around the
/// boundary. NaN keys compare equal rather than poisoning the sort.
pub fn compare_intersection(a: &LonLat, b: &LonLat) -> Ordering {
    fn key(p: &LonLat) -> f64 {
        if p.lon < 0.0 {
            p.lat - HALF_PI - EPSILON
        } else {
            HALF_PI - p.lat
        }
    }
    key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointContext {
    Default,
    Line,
    Ring,
}

/// Applies a [`Clipper`] to a full event stream.
///
/// Standalone lines clip straight through to the sink. Polygon rings are
/// routed through a second line-clip state into a buffer, because a ring's
/// visible fragments cannot be emitted until the whole polygon has been
/// seen: whether the clip boundary itself is inside the polygon decides how
/// the fragments reconnect.
pub struct ClipStage<C: Clipper, S: Stream<LonLat>> {
    clipper: C,
    sink: S,
    line: C::Line,
    ring_line: C::Line,
    buffer: LineBuffer<LonLat>,
    ring: Vec<LonLat>,
    polygon: Vec<Vec<LonLat>>,
    segments: Vec<Vec<LonLat>>,
    polygon_started: bool,
    in_polygon: bool,
    point_context: PointContext,
}

impl<C: Clipper, S: Stream<LonLat>> ClipStage<C, S> {
    pub fn new(clipper: C, sink: S) -> Self {
        let line = clipper.line();
        let ring_line = clipper.line();
        Self {
            clipper,
            sink,
            line,
            ring_line,
            buffer: LineBuffer::new(),
            ring: Vec::new(),
            polygon: Vec::new(),
            segments: Vec::new(),
            polygon_started: false,
            in_polygon: false,
            point_context: PointContext::Default,
        }
    }

    fn ring_end(&mut self) {
        self.point_context = PointContext::Default;

        if self.ring.is_empty() {
            // Degenerate ring: flush the clip state and record the empty
            // ring, emit nothing.
            self.clipper
                .line_end(&mut self.ring_line, &mut self.buffer);
            self.buffer.take();
            self.polygon.push(Vec::new());
            return;
        }

        // Feed the closing point so the line clipper sees the full ring.
        let first = self.ring[0];
        self.ring.push(first);
        self.clipper
            .line_point(&mut self.ring_line, first, &mut self.buffer);
        self.clipper
            .line_end(&mut self.ring_line, &mut self.buffer);
        let clean = self.clipper.clean(&self.ring_line);
        let mut ring_segments = self.buffer.take();

        self.ring.pop();
        self.polygon.push(std::mem::take(&mut self.ring));

        if ring_segments.is_empty() {
            return;
        }

        // No crossings: the single fragment is the whole ring, emit it now.
        // Single-point rings are dropped silently.
        if clean & CLEAN_NO_CROSSINGS != 0 {
            let segment = ring_segments.swap_remove(0);
            if segment.len() > 2 {
                if !self.polygon_started {
                    self.sink.polygon_start();
                    self.polygon_started = true;
                }
                self.sink.line_start();
                for p in &segment[..segment.len() - 1] {
                    self.sink.point(*p);
                }
                self.sink.line_end();
            }
            return;
        }

        // The ring both starts and ends inside: its trailing and leading
        // fragments are one piece.
        if ring_segments.len() > 1 && clean & CLEAN_REJOIN_FIRST_LAST != 0 {
            let leading = ring_segments.remove(0);
            if let Some(trailing) = ring_segments.last_mut() {
                trailing.extend(leading);
            }
        }

        self.segments
            .extend(ring_segments.into_iter().filter(|s| s.len() > 1));
    }
}

impl<C: Clipper, S: Stream<LonLat>> Stream<LonLat> for ClipStage<C, S> {
    fn point(&mut self, p: LonLat) {
        match self.point_context {
            PointContext::Ring => {
                self.ring.push(p);
                self.clipper
                    .line_point(&mut self.ring_line, p, &mut self.buffer);
            }
            PointContext::Line => self.clipper.line_point(&mut self.line, p, &mut self.sink),
            PointContext::Default => {
                if self.clipper.point_visible(p) {
                    self.sink.point(p);
                }
            }
        }
    }

    fn line_start(&mut self) {
        if self.in_polygon {
            self.point_context = PointContext::Ring;
            self.ring.clear();
            self.clipper
                .line_start(&mut self.ring_line, &mut self.buffer);
        } else {
            self.point_context = PointContext::Line;
            self.clipper.line_start(&mut self.line, &mut self.sink);
        }
    }

    fn line_end(&mut self) {
        if self.in_polygon {
            self.ring_end();
        } else {
            self.point_context = PointContext::Default;
            self.clipper.line_end(&mut self.line, &mut self.sink);
        }
    }

    fn polygon_start(&mut self) {
        self.in_polygon = true;
        self.segments.clear();
        self.polygon.clear();
    }

    fn polygon_end(&mut self) {
        self.in_polygon = false;
        self.point_context = PointContext::Default;

        let start_inside = polygon_contains(&self.polygon, self.clipper.start());
        let segments = std::mem::take(&mut self.segments);

        if !segments.is_empty() {
            if !self.polygon_started {
                self.sink.polygon_start();
                self.polygon_started = true;
            }
            let Self { clipper, sink, .. } = self;
            rejoin(
                segments,
                compare_intersection,
                start_inside,
                |a, b, direction, s: &mut S| {
                    clipper.interpolate(Some(a), Some(b), direction, s)
                },
                sink,
            );
        } else if start_inside {
            // The polygon swallowed the whole clip region; its image is the
            // full boundary.
            if !self.polygon_started {
                self.sink.polygon_start();
                self.polygon_started = true;
            }
            self.sink.line_start();
            self.clipper.interpolate(None, None, 1, &mut self.sink);
            self.sink.line_end();
        }

        if self.polygon_started {
            self.sink.polygon_end();
            self.polygon_started = false;
        }
        self.polygon.clear();
    }

    fn sphere(&mut self) {
        self.sink.polygon_start();
        self.sink.line_start();
        self.clipper.interpolate(None, None, 1, &mut self.sink);
        self.sink.line_end();
        self.sink.polygon_end();
    }
}
