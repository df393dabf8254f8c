use geostream::Stream;

/// Raw event log of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<P> {
    Point(P),
    LineStart,
    LineEnd,
    PolygonStart,
    PolygonEnd,
    Sphere,
}

#[derive(Debug)]
pub struct Recorder<P> {
    pub events: Vec<Event<P>>,
}

impl<P: Copy> Recorder<P> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn points(&self) -> Vec<P> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Point(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Points grouped per line, in emission order.
    pub fn rings(&self) -> Vec<Vec<P>> {
        let mut rings = Vec::new();
        let mut current: Option<Vec<P>> = None;
        for event in &self.events {
            match event {
                Event::LineStart => current = Some(Vec::new()),
                Event::LineEnd => {
                    if let Some(ring) = current.take() {
                        rings.push(ring);
                    }
                }
                Event::Point(p) => {
                    if let Some(ring) = current.as_mut() {
                        ring.push(*p);
                    }
                }
                _ => {}
            }
        }
        rings
    }
}

impl<P> Stream<P> for Recorder<P> {
    fn point(&mut self, p: P) {
        self.events.push(Event::Point(p));
    }

    fn line_start(&mut self) {
        self.events.push(Event::LineStart);
    }

    fn line_end(&mut self) {
        self.events.push(Event::LineEnd);
    }

    fn polygon_start(&mut self) {
        self.events.push(Event::PolygonStart);
    }

    fn polygon_end(&mut self) {
        self.events.push(Event::PolygonEnd);
    }

    fn sphere(&mut self) {
        self.events.push(Event::Sphere);
    }
}
