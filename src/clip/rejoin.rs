use std::cmp::Ordering;

use crate::geometry::StreamPoint;
use crate::stream::Stream;

/// One boundary crossing. Paired across two arenas: the node at index `i`
/// of the subject arena and the node at index `i` of the boundary arena
/// describe the same physical crossing, which is what `next`/`prev` walks
/// pivot through. Nodes live exactly one `rejoin` call.
#[derive(Debug)]
struct Node<P> {
    point: P,
    /// Subject side: the visible segment this crossing starts or ends.
    /// Always `None` on the boundary side.
    segment: Option<usize>,
    /// Does traversal enter the clip region at this crossing?
    entry: bool,
    next: usize,
    prev: usize,
}

/// Reconnect clipped segments into output rings.
///
/// `segments` are the portions of original rings that survived an upstream
/// line clipper, in traversal order. Segments whose endpoints coincide under
/// the shared epsilon never crossed the boundary and are re-emitted
/// directly. The rest contribute an entry and an exit crossing each; the
/// boundary-side crossings are sorted with `compare`, entry flags assigned
/// by toggling from `start_inside`, and output rings are traced by
/// alternating between subject geometry and boundary arcs drawn by
/// `interpolate` (direction ±1).
///
/// Every crossing is visited exactly once, so the traversal terminates for
/// any well-formed paired input.
pub fn rejoin<P, S, C, I>(
    segments: Vec<Vec<P>>,
    compare: C,
    start_inside: bool,
    mut interpolate: I,
    sink: &mut S,
) where
    P: StreamPoint,
    S: Stream<P> + ?Sized,
    C: Fn(&P, &P) -> Ordering,
    I: FnMut(P, P, i32, &mut S),
{
    let mut subject: Vec<Node<P>> = Vec::new();
    let mut boundary: Vec<Node<P>> = Vec::new();
    let mut kept: Vec<Vec<P>> = Vec::new();

    for segment in segments {
        if segment.len() < 2 {
            continue;
        }
        let p0 = segment[0];
        let p1 = segment[segment.len() - 1];

        // A segment that closes on itself never touched the boundary; emit
        // it as a whole ring, open form.
        if p0.nearly_equal(&p1) {
            sink.line_start();
            for p in &segment[..segment.len() - 1] {
                sink.point(*p);
            }
            sink.line_end();
            continue;
        }

        let seg = kept.len();
        subject.push(Node {
            point: p0,
            segment: Some(seg),
            entry: true,
            next: 0,
            prev: 0,
        });
        boundary.push(Node {
            point: p0,
            segment: None,
            entry: false,
            next: 0,
            prev: 0,
        });
        subject.push(Node {
            point: p1,
            segment: Some(seg),
            entry: false,
            next: 0,
            prev: 0,
        });
        boundary.push(Node {
            point: p1,
            segment: None,
            entry: true,
            next: 0,
            prev: 0,
        });
        kept.push(segment);
    }

    if subject.is_empty() {
        return;
    }
    debug_assert_eq!(subject.len(), boundary.len());
    debug_assert_eq!(subject.len() % 2, 0);

    // Subject nodes stay in encounter order; boundary nodes are linked in
    // sorted order around the clip edge without disturbing pair indices.
    let m = subject.len();
    for i in 0..m {
        subject[i].next = (i + 1) % m;
        subject[i].prev = (i + m - 1) % m;
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| compare(&boundary[a].point, &boundary[b].point));
    for (k, &i) in order.iter().enumerate() {
        boundary[i].next = order[(k + 1) % m];
        boundary[i].prev = order[(k + m - 1) % m];
    }

    let mut inside = start_inside;
    for &i in &order {
        inside = !inside;
        boundary[i].entry = inside;
    }

    // Pairs share an index, so one visited mark covers both sides.
    let mut visited = vec![false; m];
    let start = 0usize;

    loop {
        let mut current = start;
        while visited[current] {
            current = subject[current].next;
            if current == start {
                return;
            }
        }

        let mut is_subject = true;
        let mut points = subject[current].segment;
        sink.line_start();

        loop {
            visited[current] = true;
            let entry = if is_subject {
                subject[current].entry
            } else {
                boundary[current].entry
            };

            if entry {
                if is_subject {
                    if let Some(seg) = points {
                        for p in &kept[seg] {
                            sink.point(*p);
                        }
                    }
                    current = subject[current].next;
                } else {
                    let next = boundary[current].next;
                    interpolate(boundary[current].point, boundary[next].point, 1, &mut *sink);
                    current = next;
                }
            } else if is_subject {
                let prev = subject[current].prev;
                if let Some(seg) = subject[prev].segment {
                    for p in kept[seg].iter().rev() {
                        sink.point(*p);
                    }
                }
                current = prev;
            } else {
                let prev = boundary[current].prev;
                interpolate(boundary[current].point, boundary[prev].point, -1, &mut *sink);
                current = prev;
            }

            // Pivot to the partner node on the other side.
            is_subject = !is_subject;
            points = if is_subject {
                subject[current].segment
            } else {
                None
            };
            if visited[current] {
                break;
            }
        }

        sink.line_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarPoint;
    use crate::stream::recorder::{Event, Recorder};

    fn p(x: f64, y: f64) -> PlanarPoint {
        PlanarPoint::new(x, y)
    }

    /// Order boundary crossings on the line x = 0 from top to bottom, which
    /// walks the edge of the right half-plane in region order.
    fn compare_descending_y(a: &PlanarPoint, b: &PlanarPoint) -> Ordering {
        b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal)
    }

    #[test]
    fn test_closed_segment_bypasses_rejoin() {
        let ring = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        let mut rec = Recorder::new();
        let mut calls = 0usize;
        rejoin(
            vec![ring],
            compare_descending_y,
            false,
            |_a, _b, _dir, _s: &mut Recorder<PlanarPoint>| calls += 1,
            &mut rec,
        );
        assert_eq!(calls, 0, "no boundary interpolation for a closed segment");
        assert_eq!(rec.points().len(), 3);
        assert_eq!(rec.count(|e| matches!(e, Event::LineStart)), 1);
        assert_eq!(rec.count(|e| matches!(e, Event::LineEnd)), 1);
    }

    #[test]
    fn test_single_open_segment_closes_along_boundary() {
        // The right-hand part of a square cut by x = 0.
        let segment = vec![p(0.0, -1.0), p(1.0, -1.0), p(1.0, 1.0), p(0.0, 1.0)];
        let mut rec = Recorder::new();
        let mut calls = Vec::new();
        rejoin(
            vec![segment],
            compare_descending_y,
            false,
            |a, b, dir, _s: &mut Recorder<PlanarPoint>| calls.push((a, b, dir)),
            &mut rec,
        );

        assert_eq!(rec.count(|e| matches!(e, Event::LineStart)), 1);
        assert_eq!(rec.count(|e| matches!(e, Event::LineEnd)), 1);
        assert_eq!(rec.points().len(), 4);
        // One boundary arc from the exit back to the entry, forward.
        assert_eq!(calls.len(), 1);
        let (from, to, dir) = calls[0];
        assert_eq!((from.y, to.y, dir), (1.0, -1.0, 1));
    }

    #[test]
    fn test_two_segments_make_two_rings() {
        // Two bars crossing x = 0, far apart in y.
        let bar_low = vec![p(0.0, -3.0), p(1.0, -3.0), p(1.0, -1.0), p(0.0, -1.0)];
        let bar_high = vec![p(0.0, 1.0), p(1.0, 1.0), p(1.0, 3.0), p(0.0, 3.0)];
        let mut rec = Recorder::new();
        let mut calls = Vec::new();
        rejoin(
            vec![bar_low, bar_high],
            compare_descending_y,
            false,
            |a, b, dir, _s: &mut Recorder<PlanarPoint>| calls.push((a, b, dir)),
            &mut rec,
        );

        assert_eq!(rec.count(|e| matches!(e, Event::LineStart)), 2);
        assert_eq!(rec.count(|e| matches!(e, Event::LineEnd)), 2);
        assert_eq!(rec.points().len(), 8);
        assert_eq!(calls.len(), 2);
        // Both boundary walks run forward, each from a segment's exit down
        // to its own entry.
        for (from, to, dir) in &calls {
            assert_eq!(*dir, 1);
            assert!(from.y > to.y);
        }
    }

    #[test]
    fn test_degenerate_segments_are_skipped() {
        let mut rec = Recorder::new();
        rejoin(
            vec![Vec::new(), vec![p(0.5, 0.5)]],
            compare_descending_y,
            false,
            |_a, _b, _dir, _s: &mut Recorder<PlanarPoint>| {},
            &mut rec,
        );
        assert!(rec.events.is_empty());
    }
}
