//! Building outlines from a sequence of path commands.

use super::{
    error::HintError,
    fixed::Fixed,
    geometry::Point,
    path::{ElementKind, GlyphPath},
};

/// Largest accepted coordinate magnitude, half the range of [`Fixed`] so
/// the difference of any two coordinates is representable.
pub const MAX_COORDINATE: f32 = 4_000_000.0;

/// Interface for accepting a sequence of path commands.
pub trait OutlinePen {
    /// Emit a command to begin a new subpath at (x, y).
    fn move_to(&mut self, x: f32, y: f32);

    /// Emit a line segment from the current point to (x, y).
    fn line_to(&mut self, x: f32, y: f32);

    /// Emit a quadratic bezier segment from the current point with a control
    /// point at (cx0, cy0) and ending at (x, y).
    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32);

    /// Emit a cubic bezier segment from the current point with control
    /// points at (cx0, cy0) and (cx1, cy1) and ending at (x, y).
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32);

    /// Emit a command to close the current subpath.
    fn close(&mut self);
}

/// Pen that validates commands and collects them into a [`GlyphPath`].
///
/// Errors are deferred: the first invalid command is remembered and
/// returned from [`finish`](Self::finish).
#[derive(Clone, Debug)]
pub struct GlyphPathBuilder {
    path: GlyphPath,
    error: Option<HintError>,
    /// Start of the open subpath.
    start: Option<Point>,
    current: Point,
    commands: usize,
    max_elements: usize,
}

impl Default for GlyphPathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphPathBuilder {
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Creates a builder that rejects outlines with more than
    /// `max_elements` elements.
    pub fn with_limit(max_elements: usize) -> Self {
        Self {
            path: GlyphPath::default(),
            error: None,
            start: None,
            current: Point::default(),
            commands: 0,
            max_elements,
        }
    }

    /// Marks the most recent curve and the one before it as a flex pair.
    pub fn flex(&mut self) {
        let Some(last) = self.path.ids().last().copied() else {
            return;
        };
        if let Some(prev) = self.path.get(last).prev() {
            self.path.mark_flex(prev);
        }
    }

    /// Returns the collected outline.
    pub fn finish(self) -> Result<GlyphPath, HintError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.start.is_some() {
            return Err(HintError::MissingClosePath {
                x: self.current.x.to_f64(),
                y: self.current.y.to_f64(),
            });
        }
        if !self.path.iter().any(|(_, element)| element.is_drawing()) {
            return Err(HintError::EmptyPath);
        }
        Ok(self.path)
    }

    fn point(&mut self, x: f32, y: f32) -> Option<Point> {
        let in_range = |v: f32| v.is_finite() && v.abs() <= MAX_COORDINATE;
        if !in_range(x) || !in_range(y) {
            self.fail(HintError::MalformedPoint {
                index: self.commands,
            });
            return None;
        }
        Some(Point::new(
            Fixed::from_f64(x as f64),
            Fixed::from_f64(y as f64),
        ))
    }

    fn fail(&mut self, error: HintError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Checks state before a drawing command ending at `end`.
    fn begin_draw(&mut self, end: Point) -> bool {
        if self.start.is_none() {
            self.fail(HintError::ExpectedMoveTo {
                x: end.x.to_f64(),
                y: end.y.to_f64(),
            });
            return false;
        }
        self.reserve()
    }

    fn reserve(&mut self) -> bool {
        if self.path.len() >= self.max_elements {
            self.fail(HintError::TooManyElements {
                limit: self.max_elements,
            });
            return false;
        }
        true
    }

    fn push(&mut self, kind: ElementKind, points: [Point; 3]) {
        self.path.push(kind, points);
        self.current = points[2];
    }
}

impl OutlinePen for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands += 1;
        let Some(point) = self.point(x, y) else {
            return;
        };
        if self.start.is_some() {
            self.fail(HintError::MissingClosePath {
                x: self.current.x.to_f64(),
                y: self.current.y.to_f64(),
            });
            return;
        }
        if self.reserve() {
            self.push(ElementKind::MoveTo, [point; 3]);
            self.start = Some(point);
        }
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands += 1;
        let Some(point) = self.point(x, y) else {
            return;
        };
        if self.begin_draw(point) {
            self.push(ElementKind::LineTo, [point; 3]);
        }
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.commands += 1;
        let (Some(control), Some(end)) = (self.point(cx0, cy0), self.point(x, y)) else {
            return;
        };
        if !self.begin_draw(end) {
            return;
        }
        // Degree elevation: each cubic control point lies two thirds of the
        // way from an end point to the quadratic control point.
        let start = self.current;
        let elevate = |from: Point| {
            let x = from.x.to_f64() + (control.x.to_f64() - from.x.to_f64()) * 2.0 / 3.0;
            let y = from.y.to_f64() + (control.y.to_f64() - from.y.to_f64()) * 2.0 / 3.0;
            Point::new(Fixed::from_f64(x), Fixed::from_f64(y))
        };
        self.push(ElementKind::CurveTo, [elevate(start), elevate(end), end]);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands += 1;
        let (Some(c0), Some(c1), Some(end)) =
            (self.point(cx0, cy0), self.point(cx1, cy1), self.point(x, y))
        else {
            return;
        };
        if self.begin_draw(end) {
            self.push(ElementKind::CurveTo, [c0, c1, end]);
        }
    }

    fn close(&mut self) {
        self.commands += 1;
        let Some(start) = self.start else {
            self.fail(HintError::ExpectedMoveTo {
                x: self.current.x.to_f64(),
                y: self.current.y.to_f64(),
            });
            return;
        };
        if self.reserve() {
            self.push(ElementKind::ClosePath, [start; 3]);
            self.start = None;
        }
    }
}

#[cfg(feature = "kurbo")]
impl GlyphPath {
    /// Converts a kurbo path. Quadratic curves are elevated to cubics.
    pub fn from_bez_path(path: &kurbo::BezPath) -> Result<Self, HintError> {
        let mut builder = GlyphPathBuilder::new();
        for el in path.elements() {
            match *el {
                kurbo::PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
                kurbo::PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
                kurbo::PathEl::QuadTo(c, p) => {
                    builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
                }
                kurbo::PathEl::CurveTo(c0, c1, p) => builder.curve_to(
                    c0.x as f32,
                    c0.y as f32,
                    c1.x as f32,
                    c1.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                kurbo::PathEl::ClosePath => builder.close(),
            }
        }
        builder.finish()
    }

    /// Converts the outline, including any split curves, to a kurbo path.
    pub fn to_bez_path(&self) -> kurbo::BezPath {
        let to_kurbo = |p: Point| kurbo::Point::new(p.x.to_f64(), p.y.to_f64());
        let mut bez = kurbo::BezPath::new();
        for (_, element) in self.iter() {
            let end = to_kurbo(element.end());
            match element.kind() {
                ElementKind::MoveTo => bez.move_to(end),
                ElementKind::LineTo => bez.line_to(end),
                ElementKind::CurveTo => {
                    if let Some((c0, c1)) = element.controls() {
                        bez.curve_to(to_kurbo(c0), to_kurbo(c1), end);
                    }
                }
                ElementKind::ClosePath => bez.close_path(),
            }
        }
        bez
    }
}
