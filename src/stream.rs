//! The geometry event protocol that glues the pipeline together.
//!
//! Every stage implements [`Stream`] and forwards a transformed event
//! sequence to the stage it owns, so geometry flows through the whole
//! pipeline without intermediate collections. The grammar is strict:
//! `polygon_start`, then one or more rings each bounded by `line_start` /
//! `line_end`, then `polygon_end`; open lines use `line_start` / `line_end`
//! outside any polygon; `sphere` stands alone. Zero points between
//! `line_start` and `line_end` must be tolerated.

use serde::{Deserialize, Serialize};

use crate::geometry::{LonLat, Position, StreamPoint};

/// A consumer of geometry events over points of type `P`.
///
/// Stages are synchronous, single-threaded, non-reentrant filters; each owns
/// its downstream exclusively. Process independent geometries concurrently
/// only on separate pipeline instances.
pub trait Stream<P> {
    fn point(&mut self, p: P);
    fn line_start(&mut self);
    fn line_end(&mut self);
    fn polygon_start(&mut self);
    fn polygon_end(&mut self);

    /// The full globe outline. Most consumers ignore it.
    fn sphere(&mut self) {}
}

impl<P, S: Stream<P> + ?Sized> Stream<P> for &mut S {
    fn point(&mut self, p: P) {
        (**self).point(p)
    }

    fn line_start(&mut self) {
        (**self).line_start()
    }

    fn line_end(&mut self) {
        (**self).line_end()
    }

    fn polygon_start(&mut self) {
        (**self).polygon_start()
    }

    fn polygon_end(&mut self) {
        (**self).polygon_end()
    }

    fn sphere(&mut self) {
        (**self).sphere()
    }
}

/// GeoJSON-shaped geometry, coordinates in degrees.
///
/// `Sphere` is the customary extension for the full globe. Deserialization
/// validates every coordinate (see [`Position`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    Sphere,
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Emit this geometry as radian events into a stream.
    ///
    /// Polygon rings that arrive closed (GeoJSON duplicates the first point
    /// at the end) are streamed open; the resampler re-closes projected
    /// rings itself.
    pub fn stream_to<S: Stream<LonLat> + ?Sized>(&self, sink: &mut S) {
        match self {
            Geometry::Point { coordinates } => sink.point(coordinates.radians()),
            Geometry::MultiPoint { coordinates } => {
                for p in coordinates {
                    sink.point(p.radians());
                }
            }
            Geometry::LineString { coordinates } => stream_line(coordinates, sink),
            Geometry::MultiLineString { coordinates } => {
                for line in coordinates {
                    stream_line(line, sink);
                }
            }
            Geometry::Polygon { coordinates } => stream_polygon(coordinates, sink),
            Geometry::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    stream_polygon(polygon, sink);
                }
            }
            Geometry::Sphere => sink.sphere(),
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.stream_to(sink);
                }
            }
        }
    }
}

fn stream_line<S: Stream<LonLat> + ?Sized>(line: &[Position], sink: &mut S) {
    sink.line_start();
    for p in line {
        sink.point(p.radians());
    }
    sink.line_end();
}

fn stream_polygon<S: Stream<LonLat> + ?Sized>(rings: &[Vec<Position>], sink: &mut S) {
    sink.polygon_start();
    for ring in rings {
        stream_ring(ring, sink);
    }
    sink.polygon_end();
}

fn stream_ring<S: Stream<LonLat> + ?Sized>(ring: &[Position], sink: &mut S) {
    // Drop a duplicated closing point; the ring is streamed open.
    let n = match (ring.first(), ring.last()) {
        (Some(first), Some(last))
            if ring.len() > 1 && first.radians().nearly_equal(&last.radians()) =>
        {
            ring.len() - 1
        }
        _ => ring.len(),
    };
    sink.line_start();
    for p in &ring[..n] {
        sink.point(p.radians());
    }
    sink.line_end();
}


#[cfg(test)]
mod tests {
    use super::recorder::{Event, Recorder};
    use super::*;

    fn pos(lon: f64, lat: f64) -> Position {
        Position::new(lon, lat).unwrap()
    }

    #[test]
    fn test_polygon_grammar_and_closing_point_dropped() {
        let geometry = Geometry::Polygon {
            coordinates: vec![vec![
                pos(0.0, 0.0),
                pos(10.0, 0.0),
                pos(10.0, 10.0),
                pos(0.0, 0.0),
            ]],
        };
        let mut rec = Recorder::new();
        geometry.stream_to(&mut rec);

        assert_eq!(rec.events.first(), Some(&Event::PolygonStart));
        assert_eq!(rec.events.last(), Some(&Event::PolygonEnd));
        // Closing duplicate dropped: three points remain.
        assert_eq!(rec.points().len(), 3);
        assert_eq!(rec.count(|e| matches!(e, Event::LineStart)), 1);
        assert_eq!(rec.count(|e| matches!(e, Event::LineEnd)), 1);
    }

    #[test]
    fn test_empty_line_is_tolerated() {
        let geometry = Geometry::LineString {
            coordinates: Vec::new(),
        };
        let mut rec = Recorder::new();
        geometry.stream_to(&mut rec);
        assert_eq!(rec.events, vec![Event::LineStart, Event::LineEnd]);
    }

    #[test]
    fn test_sphere_event() {
        let mut rec = Recorder::new();
        Geometry::Sphere.stream_to(&mut rec);
        assert_eq!(rec.events, vec![Event::Sphere]);
    }

    #[test]
    fn test_geojson_round_trip() {
        let json = r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[10.0,0.0],[10.0,10.0],[0.0,0.0]]]}"#;
        let geometry: Geometry = serde_json::from_str(json).unwrap();
        match &geometry {
            Geometry::Polygon { coordinates } => assert_eq!(coordinates[0].len(), 4),
            other => panic!("unexpected geometry {other:?}"),
        }
        let back = serde_json::to_string(&geometry).unwrap();
        assert_eq!(serde_json::from_str::<Geometry>(&back).unwrap(), geometry);
    }
}
