use crate::stream::Stream;

/// Accumulates the visible sub-lines a line clipper produces while a polygon
/// ring is being clipped, so they can be rejoined once the whole ring has
/// been seen.
#[derive(Debug)]
pub(crate) struct LineBuffer<P> {
    lines: Vec<Vec<P>>,
}

impl<P> LineBuffer<P> {
    pub(crate) fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Drain the collected segments, leaving the buffer ready for reuse.
    pub(crate) fn take(&mut self) -> Vec<Vec<P>> {
        std::mem::take(&mut self.lines)
    }
}

impl<P> Stream<P> for LineBuffer<P> {
    fn point(&mut self, p: P) {
        debug_assert!(!self.lines.is_empty(), "point before line_start");
        if let Some(line) = self.lines.last_mut() {
            line.push(p);
        }
    }

    fn line_start(&mut self) {
        self.lines.push(Vec::new());
    }

    fn line_end(&mut self) {}
    fn polygon_start(&mut self) {}
    fn polygon_end(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_segments() {
        let mut buffer: LineBuffer<i32> = LineBuffer::new();
        buffer.line_start();
        buffer.point(1);
        buffer.point(2);
        buffer.line_end();
        buffer.line_start();
        buffer.point(3);
        buffer.line_end();

        assert_eq!(buffer.take(), vec![vec![1, 2], vec![3]]);
        assert!(buffer.take().is_empty());
    }
}
