use super::Projector;

/// Plate carrée: longitude and latitude map linearly to x and y.
///
/// Output is screen-oriented (y grows downward). At `scale = 1` and zero
/// translate this is the identity on radians, which makes it the reference
/// projector for pipeline tests.
#[derive(Debug, Clone)]
pub struct Equirectangular {
    /// Output units per radian.
    pub scale: f64,
    pub translate: (f64, f64),
}

impl Default for Equirectangular {
    fn default() -> Self {
        Self {
            scale: 152.63,
            translate: (480.0, 250.0),
        }
    }
}

impl Projector for Equirectangular {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.translate.0 + self.scale * lon,
            self.translate.1 - self.scale * lat,
        )
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((
            (x - self.translate.0) / self.scale,
            (self.translate.1 - y) / self.scale,
        ))
    }
}
