use super::{CLEAN_NO_CROSSINGS, CLEAN_REJOIN_FIRST_LAST, Clipper};
use crate::geometry::{Cartesian, EPSILON, LonLat, PI, StreamPoint, TAU, clamped_acos};
use crate::stream::Stream;

/// Angular step of interpolated boundary arcs.
const INTERPOLATE_STEP: f64 = 6.0 * PI / 180.0;

/// Clips to the small circle at a given angular radius from (0°, 0°), the
/// usual projection-validity horizon.
///
/// Radii below 90° keep a cap around the center; radii above 90° discard a
/// cap around the antipode.
#[derive(Debug, Clone)]
pub struct CircleClip {
    radius: f64,
    cr: f64,
    small_radius: bool,
    not_hemisphere: bool,
}

impl CircleClip {
    /// Build a clipper for the given angular radius in radians.
    pub fn new(radius: f64) -> Self {
        let cr = radius.cos();
        Self {
            radius,
            cr,
            small_radius: cr > 0.0,
            not_hemisphere: cr.abs() > EPSILON,
        }
    }

    /// Intersection of the great circle through `a` and `b` with the clip
    /// circle's plane, first root. Degenerate (parallel) configurations
    /// fall back to `a` itself.
    fn intersect(&self, a: LonLat, b: LonLat) -> Option<LonLat> {
        self.intersect_roots(a, b).map(|(q, _)| q.spherical())
    }

    /// Both intersection roots, returned only when the first lies between
    /// `a` and `b` on the segment.
    fn intersect_two(&self, a: LonLat, b: LonLat) -> Option<(LonLat, LonLat)> {
        let (q, q1) = self.intersect_roots_strict(a, b)?;
        let q = q.spherical();

        let (mut lambda0, mut lambda1) = (a.lon, b.lon);
        let (mut phi0, mut phi1) = (a.lat, b.lat);
        if lambda1 < lambda0 {
            std::mem::swap(&mut lambda0, &mut lambda1);
        }
        let delta = lambda1 - lambda0;
        let polar = (delta - PI).abs() < EPSILON;
        let meridian = polar || delta < EPSILON;
        if !polar && phi1 < phi0 {
            std::mem::swap(&mut phi0, &mut phi1);
        }

        let between = if meridian {
            if polar {
                (phi0 + phi1 > 0.0)
                    ^ (q.lat
                        < if (q.lon - lambda0).abs() < EPSILON {
                            phi0
                        } else {
                            phi1
                        })
            } else {
                phi0 <= q.lat && q.lat <= phi1
            }
        } else {
            (delta > PI) ^ (lambda0 <= q.lon && q.lon <= lambda1)
        };

        if between { Some((q, q1.spherical())) } else { None }
    }

    /// Shared root computation: solves for the points on both the clip
    /// plane and the unit sphere along the great circle through `a`, `b`.
    fn intersect_roots(&self, a: LonLat, b: LonLat) -> Option<(Cartesian, Cartesian)> {
        match self.solve_roots(a, b) {
            RootSolution::Degenerate => Some((Cartesian::from_spherical(a), Cartesian::from_spherical(a))),
            RootSolution::None => None,
            RootSolution::Roots(q, q1) => Some((q, q1)),
        }
    }

    fn intersect_roots_strict(&self, a: LonLat, b: LonLat) -> Option<(Cartesian, Cartesian)> {
        match self.solve_roots(a, b) {
            RootSolution::Roots(q, q1) => Some((q, q1)),
            _ => None,
        }
    }

    fn solve_roots(&self, a: LonLat, b: LonLat) -> RootSolution {
        let pa = Cartesian::from_spherical(a);
        let pb = Cartesian::from_spherical(b);

        // n1 is the clip plane normal, n2 the great-circle normal.
        let n1 = Cartesian::new(1.0, 0.0, 0.0);
        let n2 = pa.cross(pb);
        let n2n2 = n2.dot(n2);
        let n1n2 = n2.x;
        let determinant = n2n2 - n1n2 * n1n2;
        if determinant == 0.0 {
            return RootSolution::Degenerate;
        }

        let c1 = self.cr * n2n2 / determinant;
        let c2 = -self.cr * n1n2 / determinant;
        let u = n1.cross(n2);
        let origin = n1.scale(c1).add(n2.scale(c2));

        // |origin + t·u| = 1
        let w = origin.dot(u);
        let uu = u.dot(u);
        let t2 = w * w - uu * (origin.dot(origin) - 1.0);
        if t2 < 0.0 {
            return RootSolution::None;
        }
        let t = t2.sqrt();

        let q = u.scale((-w - t) / uu).add(origin);
        let q1 = u.scale((-w + t) / uu).add(origin);
        RootSolution::Roots(q, q1)
    }

    /// Outcode relative to the square bounding the invisible region, used
    /// to skip the expensive two-root test for far-apart segments.
    fn code(&self, p: LonLat) -> u8 {
        let r = if self.small_radius {
            self.radius
        } else {
            PI - self.radius
        };
        let mut code = 0u8;
        if p.lon < -r {
            code |= 1;
        } else if p.lon > r {
            code |= 2;
        }
        if p.lat < -r {
            code |= 4;
        } else if p.lat > r {
            code |= 8;
        }
        code
    }
}

enum RootSolution {
    Degenerate,
    None,
    Roots(Cartesian, Cartesian),
}

#[derive(Debug)]
pub struct CircleLine {
    point0: Option<LonLat>,
    c0: u8,
    v0: bool,
    v00: bool,
    no_crossings: bool,
}

impl Clipper for CircleClip {
    type Line = CircleLine;

    fn line(&self) -> CircleLine {
        CircleLine {
            point0: None,
            c0: 0,
            v0: false,
            v00: false,
            no_crossings: true,
        }
    }

    fn point_visible(&self, p: LonLat) -> bool {
        p.lon.cos() * p.lat.cos() > self.cr
    }

    fn line_start(&self, line: &mut CircleLine, _sink: &mut dyn Stream<LonLat>) {
        // The output line opens lazily at the first visible point.
        line.point0 = None;
        line.c0 = 0;
        line.v0 = false;
        line.v00 = false;
        line.no_crossings = true;
    }

    fn line_point(&self, line: &mut CircleLine, p: LonLat, sink: &mut dyn Stream<LonLat>) {
        let point1 = p;
        let v = self.point_visible(point1);
        let c = if self.small_radius {
            if v { 0 } else { self.code(point1) }
        } else if v {
            self.code(LonLat::new(
                point1.lon + if point1.lon < 0.0 { PI } else { -PI },
                point1.lat,
            ))
        } else {
            0
        };

        let mut prev = line.point0;
        if prev.is_none() {
            line.v00 = v;
            line.v0 = v;
            if v {
                sink.line_start();
            }
        }

        if let Some(point0) = prev {
            if v != line.v0 {
                line.no_crossings = false;
                if v {
                    // Coming back inside: open a fresh line at the crossing.
                    sink.line_start();
                    if let Some(p2) = self.intersect(point1, point0) {
                        sink.point(p2);
                        prev = Some(p2);
                    }
                } else {
                    // Leaving: close the line at the crossing.
                    if let Some(p2) = self.intersect(point0, point1) {
                        sink.point(p2);
                        prev = Some(p2);
                    }
                    sink.line_end();
                }
            } else if self.not_hemisphere && (self.small_radius ^ v) {
                // No visibility change at the endpoints, but the chord may
                // still cross the cap boundary twice in between.
                if c & line.c0 == 0 {
                    if let Some((t0, t1)) = self.intersect_two(point1, point0) {
                        line.no_crossings = false;
                        if self.small_radius {
                            sink.line_start();
                            sink.point(t0);
                            sink.point(t1);
                            sink.line_end();
                        } else {
                            sink.point(t1);
                            sink.line_end();
                            sink.line_start();
                            sink.point(t0);
                        }
                    }
                }
            }
        }

        if v {
            let emit = match prev {
                None => true,
                Some(p0) => !p0.nearly_equal(&point1),
            };
            if emit {
                sink.point(point1);
            }
        }

        line.point0 = Some(point1);
        line.v0 = v;
        line.c0 = c;
    }

    fn line_end(&self, line: &mut CircleLine, sink: &mut dyn Stream<LonLat>) {
        if line.v0 {
            sink.line_end();
        }
        line.point0 = None;
    }

    fn clean(&self, line: &CircleLine) -> u8 {
        let mut clean = if line.no_crossings {
            CLEAN_NO_CROSSINGS
        } else {
            0
        };
        if line.v00 && line.v0 {
            clean |= CLEAN_REJOIN_FIRST_LAST;
        }
        clean
    }

    fn interpolate(
        &self,
        from: Option<LonLat>,
        to: Option<LonLat>,
        direction: i32,
        sink: &mut dyn Stream<LonLat>,
    ) {
        circle_arc(sink, self.radius, INTERPOLATE_STEP, direction, from, to);
    }

    fn start(&self) -> LonLat {
        if self.small_radius {
            LonLat::new(0.0, -self.radius)
        } else {
            LonLat::new(-PI, self.radius - PI)
        }
    }
}

/// Emit the small-circle arc between two boundary points (or the whole
/// circle) as stepped points, walking in the given direction.
fn circle_arc(
    sink: &mut dyn Stream<LonLat>,
    radius: f64,
    delta: f64,
    direction: i32,
    from: Option<LonLat>,
    to: Option<LonLat>,
) {
    if delta == 0.0 {
        return;
    }
    let cos_radius = radius.cos();
    let sin_radius = radius.sin();
    let step = direction as f64 * delta;

    let (t0, t1) = match (from, to) {
        (Some(from), Some(to)) => {
            let mut t0 = circle_angle(cos_radius, from);
            let t1 = circle_angle(cos_radius, to);
            let wraps = if direction > 0 { t0 < t1 } else { t0 > t1 };
            if wraps {
                t0 += direction as f64 * TAU;
            }
            (t0, t1)
        }
        _ => (radius + direction as f64 * TAU, radius - step / 2.0),
    };

    let mut t = t0;
    loop {
        let within = if direction > 0 { t > t1 } else { t < t1 };
        if !within {
            break;
        }
        let point = Cartesian::new(cos_radius, -sin_radius * t.cos(), -sin_radius * t.sin())
            .spherical();
        sink.point(point);
        t -= step;
    }
}

/// Angular position of a boundary point around the clip circle.
fn circle_angle(cos_radius: f64, point: LonLat) -> f64 {
    let mut p = Cartesian::from_spherical(point);
    p.x -= cos_radius;
    let p = p.normalize();
    let radius = clamped_acos(-p.y);
    let signed = if -p.z < 0.0 { -radius } else { radius };
    (signed + TAU - EPSILON) % TAU
}
