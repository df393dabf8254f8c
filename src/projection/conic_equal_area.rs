use super::Projector;
use crate::geometry::{EPSILON, clamped_asin};

/// Albers-style conic equal-area projection with two standard parallels.
///
/// When the parallels are symmetric about the equator the cone degenerates
/// (n ≈ 0) and the projection falls back to the cylindrical equal-area
/// formula on the first parallel.
#[derive(Debug, Clone)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    cos_y0: f64,
    pub scale: f64,
    pub translate: (f64, f64),
}

impl ConicEqualArea {
    /// Build from the two standard parallels, in degrees.
    pub fn new(parallel0: f64, parallel1: f64) -> Self {
        let y0 = parallel0.to_radians();
        let y1 = parallel1.to_radians();
        let sy0 = y0.sin();
        let n = (sy0 + y1.sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        Self {
            n,
            c,
            r0: c.sqrt() / n,
            cos_y0: y0.cos(),
            scale: 155.424,
            translate: (480.0, 250.0),
        }
    }

    fn project_raw(&self, lon: f64, lat: f64) -> (f64, f64) {
        if self.n.abs() < EPSILON {
            // cylindrical equal-area fallback
            (lon * self.cos_y0, lat.sin() / self.cos_y0)
        } else {
            let r = (self.c - 2.0 * self.n * lat.sin()).sqrt() / self.n;
            let nl = lon * self.n;
            (r * nl.sin(), self.r0 - r * nl.cos())
        }
    }

    fn invert_raw(&self, x: f64, y: f64) -> (f64, f64) {
        if self.n.abs() < EPSILON {
            (x / self.cos_y0, clamped_asin(y * self.cos_y0))
        } else {
            let r0y = self.r0 - y;
            let sign = if r0y < 0.0 {
                -1.0
            } else if r0y > 0.0 {
                1.0
            } else {
                0.0
            };
            (
                x.atan2(r0y.abs()) / self.n * sign,
                clamped_asin((self.c - (x * x + r0y * r0y) * self.n * self.n) / (2.0 * self.n)),
            )
        }
    }
}

impl Default for ConicEqualArea {
    fn default() -> Self {
        Self::new(29.5, 45.5)
    }
}

impl Projector for ConicEqualArea {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.project_raw(lon, lat);
        (
            self.translate.0 + self.scale * x,
            self.translate.1 - self.scale * y,
        )
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some(self.invert_raw(
            (x - self.translate.0) / self.scale,
            (self.translate.1 - y) / self.scale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_round_trip() {
        let projector = ConicEqualArea::default();
        for &(lon, lat) in &[(0.0, 0.0), (-1.2, 0.8), (0.5, -0.6)] {
            let (x, y) = projector.project(lon, lat);
            let (lon2, lat2) = projector.invert(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-9, "lon {lon} -> {lon2}");
            assert!((lat - lat2).abs() < 1e-9, "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn test_symmetric_parallels_fall_back_to_cylindrical() {
        let projector = ConicEqualArea::new(-30.0, 30.0);
        let (x, y) = projector.project(0.4, 0.3);
        let (lon, lat) = projector.invert(x, y).unwrap();
        assert!((lon - 0.4).abs() < 1e-9);
        assert!((lat - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_origin_lands_on_translate() {
        let projector = ConicEqualArea::default();
        let (x, _) = projector.project(0.0, 0.0);
        assert!((x - 480.0).abs() < 1e-9);
    }
}
