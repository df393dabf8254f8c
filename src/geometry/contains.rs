use super::cartesian::{Cartesian, clamped_asin};
use super::point::{EPSILON, LonLat, PI, QUARTER_PI, TAU};

/// Test whether a spherical polygon contains a point.
///
/// Works on unit-sphere direction vectors, not planar coordinates; planar
/// approximations are unstable near the poles. Rings may be open (the
/// closing edge is implied) and empty rings are skipped.
///
/// # Algorithm
/// 1. Accumulate the signed longitudinal angle of every edge, with a ±τ
///    correction for edges whose longitudinal delta exceeds π (antimeridian
///    crossings would otherwise wrap the sum).
/// 2. Accumulate a spherical-excess-like area sum via `atan2` of the
///    half-angle vectors of successive vertices.
/// 3. Count signed crossings of the meridian arc from the query point to the
///    South pole: an edge straddling the query meridian below the query
///    latitude increments or decrements the winding counter depending on its
///    direction.
///
/// The South pole is inside when the polygon winds around it clockwise, or
/// when it does not cumulatively wind but has negative (counter-clockwise)
/// area. The query point is on the same side as the South pole exactly when
/// the crossing count is even, so the answer is the pole status XOR the
/// counter's parity.
pub fn polygon_contains(polygon: &[Vec<LonLat>], point: LonLat) -> bool {
    let lambda = point.lon;
    let phi = point.lat;
    let normal = Cartesian::new(lambda.sin(), -lambda.cos(), 0.0);

    let mut angle = 0.0;
    let mut winding = 0i32;
    let mut sum = 0.0;

    for ring in polygon {
        let Some(&last) = ring.last() else {
            continue;
        };

        let mut point0 = last;
        let mut lambda0 = point0.lon;
        let phi0 = point0.lat / 2.0 + QUARTER_PI;
        let mut sin_phi0 = phi0.sin();
        let mut cos_phi0 = phi0.cos();

        for &point1 in ring {
            let lambda1 = point1.lon;
            let phi1 = point1.lat / 2.0 + QUARTER_PI;
            let sin_phi1 = phi1.sin();
            let cos_phi1 = phi1.cos();
            let delta = lambda1 - lambda0;
            let sign = if delta >= 0.0 { 1.0 } else { -1.0 };
            let abs_delta = sign * delta;
            let antimeridian = abs_delta > PI;
            let k = sin_phi0 * sin_phi1;

            sum += (k * sign * abs_delta.sin()).atan2(cos_phi0 * cos_phi1 + k * abs_delta.cos());
            angle += if antimeridian { delta + sign * TAU } else { delta };

            // Does the edge straddle the query meridian, on the arc between
            // the query point and the South pole?
            if antimeridian ^ (lambda0 >= lambda) ^ (lambda1 >= lambda) {
                let arc = Cartesian::from_spherical(point0)
                    .cross(Cartesian::from_spherical(point1))
                    .normalize();
                let intersection = normal.cross(arc).normalize();
                let phi_arc = if antimeridian ^ (delta >= 0.0) { -1.0 } else { 1.0 }
                    * clamped_asin(intersection.z);
                if phi > phi_arc
                    || (phi == phi_arc
                        && ((arc.x != 0.0 && !arc.x.is_nan())
                            || (arc.y != 0.0 && !arc.y.is_nan())))
                {
                    winding += if antimeridian ^ (delta >= 0.0) { 1 } else { -1 };
                }
            }

            lambda0 = lambda1;
            sin_phi0 = sin_phi1;
            cos_phi0 = cos_phi1;
            point0 = point1;
        }
    }

    (angle < -EPSILON || (angle < EPSILON && sum < -EPSILON)) ^ ((winding & 1) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_deg(points: &[(f64, f64)]) -> Vec<LonLat> {
        points
            .iter()
            .map(|&(lon, lat)| LonLat::new(lon.to_radians(), lat.to_radians()))
            .collect()
    }

    #[test]
    fn test_square_contains_origin() {
        let square = vec![ring_deg(&[
            (-10.0, -10.0),
            (10.0, -10.0),
            (10.0, 10.0),
            (-10.0, 10.0),
        ])];
        assert!(polygon_contains(
            &square,
            LonLat::new(0.0, 0.0)
        ));
        assert!(!polygon_contains(
            &square,
            LonLat::new(50f64.to_radians(), 50f64.to_radians())
        ));
    }

    #[test]
    fn test_empty_rings_are_skipped() {
        let polygon = vec![
            Vec::new(),
            ring_deg(&[(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0)]),
        ];
        assert!(polygon_contains(&polygon, LonLat::new(0.0, 0.0)));
    }

    #[test]
    fn test_antimeridian_straddling_square() {
        // Longitudes 170°..-170°, the ring crosses ±180.
        let square = vec![ring_deg(&[
            (170.0, -10.0),
            (-170.0, -10.0),
            (-170.0, 10.0),
            (170.0, 10.0),
        ])];
        assert!(polygon_contains(
            &square,
            LonLat::new(180f64.to_radians(), 0.0)
        ));
        assert!(!polygon_contains(&square, LonLat::new(0.0, 0.0)));
    }

    #[test]
    fn test_ring_around_south_pole() {
        // An eastward parallel at -60° encloses the polar cap beneath it:
        // the cumulative longitudinal angle winds once around the pole.
        let ring: Vec<LonLat> = (0..72)
            .map(|i| {
                let mut lon = i as f64 * 5.0;
                if lon > 180.0 {
                    lon -= 360.0;
                }
                LonLat::new(lon.to_radians(), (-60f64).to_radians())
            })
            .collect();
        let polygon = vec![ring];
        assert!(polygon_contains(
            &polygon,
            LonLat::new(0.0, (-80f64).to_radians())
        ));
        assert!(!polygon_contains(
            &polygon,
            LonLat::new(0.0, (80f64).to_radians())
        ));
    }

    #[test]
    fn test_closed_ring_matches_open_ring() {
        let mut closed = ring_deg(&[
            (-10.0, -10.0),
            (10.0, -10.0),
            (10.0, 10.0),
            (-10.0, 10.0),
        ]);
        let open = vec![closed.clone()];
        closed.push(closed[0]);
        let closed = vec![closed];
        let probe = LonLat::new(0.05, 0.05);
        assert_eq!(
            polygon_contains(&open, probe),
            polygon_contains(&closed, probe)
        );
    }
}
