use super::{CLEAN_NO_CROSSINGS, CLEAN_REJOIN_FIRST_LAST, Clipper};
use crate::geometry::{EPSILON, HALF_PI, LonLat, PI};
use crate::stream::Stream;

/// Clips lines at the ±180° meridian.
///
/// Every point is visible; the work is splitting lines whose segments wrap
/// across the antimeridian (or run over a pole) so downstream planar
/// interpolation never takes the long way around.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntimeridianClip;

#[derive(Debug)]
pub struct AntimeridianLine {
    lambda0: f64,
    phi0: f64,
    sign0: f64,
    crossed: bool,
}

impl Clipper for AntimeridianClip {
    type Line = AntimeridianLine;

    fn line(&self) -> AntimeridianLine {
        AntimeridianLine {
            lambda0: f64::NAN,
            phi0: f64::NAN,
            sign0: f64::NAN,
            crossed: false,
        }
    }

    fn point_visible(&self, _p: LonLat) -> bool {
        true
    }

    fn line_start(&self, line: &mut AntimeridianLine, sink: &mut dyn Stream<LonLat>) {
        sink.line_start();
        line.lambda0 = f64::NAN;
        line.phi0 = f64::NAN;
        line.sign0 = f64::NAN;
        line.crossed = false;
    }

    fn line_point(&self, line: &mut AntimeridianLine, p: LonLat, sink: &mut dyn Stream<LonLat>) {
        let mut lambda1 = p.lon;
        let phi1 = p.lat;
        let sign1 = if lambda1 > 0.0 { PI } else { -PI };
        let delta = (lambda1 - line.lambda0).abs();

        if (delta - PI).abs() < EPSILON {
            // The segment runs over a pole: route it through the pole at the
            // snapped latitude.
            let snap = if (line.phi0 + phi1) / 2.0 > 0.0 {
                HALF_PI
            } else {
                -HALF_PI
            };
            sink.point(LonLat::new(line.lambda0, snap));
            sink.point(LonLat::new(line.sign0, snap));
            sink.line_end();
            sink.line_start();
            sink.point(LonLat::new(sign1, snap));
            sink.point(LonLat::new(lambda1, snap));
            line.crossed = true;
        } else if line.sign0 != sign1 && delta >= PI {
            // Antimeridian crossing: break the line at the crossing
            // latitude. Endpoints sitting exactly on ±π are nudged off so
            // the intersection is well defined.
            if (line.lambda0 - line.sign0).abs() < EPSILON {
                line.lambda0 -= line.sign0 * EPSILON;
            }
            if (lambda1 - sign1).abs() < EPSILON {
                lambda1 -= sign1 * EPSILON;
            }
            let phi = intersect_latitude(line.lambda0, line.phi0, lambda1, phi1);
            sink.point(LonLat::new(line.sign0, phi));
            sink.line_end();
            sink.line_start();
            sink.point(LonLat::new(sign1, phi));
            line.crossed = true;
        }

        line.lambda0 = lambda1;
        line.phi0 = phi1;
        line.sign0 = sign1;
        sink.point(LonLat::new(lambda1, phi1));
    }

    fn line_end(&self, line: &mut AntimeridianLine, sink: &mut dyn Stream<LonLat>) {
        sink.line_end();
        line.lambda0 = f64::NAN;
        line.phi0 = f64::NAN;
    }

    fn clean(&self, line: &AntimeridianLine) -> u8 {
        if line.crossed {
            CLEAN_REJOIN_FIRST_LAST
        } else {
            CLEAN_NO_CROSSINGS
        }
    }

    fn interpolate(
        &self,
        from: Option<LonLat>,
        to: Option<LonLat>,
        direction: i32,
        sink: &mut dyn Stream<LonLat>,
    ) {
        match (from, to) {
            (Some(from), Some(to)) => {
                if (from.lon - to.lon).abs() > EPSILON {
                    // Crossings on opposite sides: walk over the nearer pole.
                    let lambda = if from.lon < to.lon { PI } else { -PI };
                    let phi = direction as f64 * lambda / 2.0;
                    sink.point(LonLat::new(-lambda, phi));
                    sink.point(LonLat::new(0.0, phi));
                    sink.point(LonLat::new(lambda, phi));
                } else {
                    sink.point(to);
                }
            }
            _ => {
                // Whole boundary: both sides of the antimeridian plus both
                // poles.
                let phi = direction as f64 * HALF_PI;
                sink.point(LonLat::new(-PI, phi));
                sink.point(LonLat::new(0.0, phi));
                sink.point(LonLat::new(PI, phi));
                sink.point(LonLat::new(PI, 0.0));
                sink.point(LonLat::new(PI, -phi));
                sink.point(LonLat::new(0.0, -phi));
                sink.point(LonLat::new(-PI, -phi));
                sink.point(LonLat::new(-PI, 0.0));
                sink.point(LonLat::new(-PI, phi));
            }
        }
    }

    fn start(&self) -> LonLat {
        // Southern end of the boundary walk; matches the sort order of
        // `compare_intersection` so the entry/exit toggle is seeded where
        // the walk begins.
        LonLat::new(-PI, -HALF_PI)
    }
}

/// Latitude where the great circle through two points crosses the
/// antimeridian.
fn intersect_latitude(lambda0: f64, phi0: f64, lambda1: f64, phi1: f64) -> f64 {
    let sin_lambda0_lambda1 = (lambda0 - lambda1).sin();
    if sin_lambda0_lambda1.abs() > EPSILON {
        let cos_phi0 = phi0.cos();
        let cos_phi1 = phi1.cos();
        ((phi0.sin() * cos_phi1 * lambda1.sin() - phi1.sin() * cos_phi0 * lambda0.sin())
            / (cos_phi0 * cos_phi1 * sin_lambda0_lambda1))
            .atan()
    } else {
        (phi0 + phi1) / 2.0
    }
}
