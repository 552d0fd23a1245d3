//! Adaptive flattening of cubic curves.
//!
//! Curves are bisected at their midpoint until each piece is within a
//! tolerance of its chord. Subdivision uses an explicit fixed size work
//! stack so the flattener never allocates and always terminates, even for
//! degenerate or self intersecting input.

use super::{
    fixed::Fixed,
    geometry::{Point, Rect},
};

/// Maximum number of bisection levels.
pub const MAX_DEPTH: u8 = 6;

const STACK_SIZE: usize = MAX_DEPTH as usize + 1;

/// Cubic Bézier curve.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Cubic {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl Cubic {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Splits the curve at t = 0.5 using De Casteljau's algorithm.
    pub fn split(&self) -> (Self, Self) {
        let p01 = self.p0.midpoint(self.p1);
        let p12 = self.p1.midpoint(self.p2);
        let p23 = self.p2.midpoint(self.p3);
        let p012 = p01.midpoint(p12);
        let p123 = p12.midpoint(p23);
        let mid = p012.midpoint(p123);
        (
            Self::new(self.p0, p01, p012, mid),
            Self::new(mid, p123, p23, self.p3),
        )
    }

    /// Returns the same curve traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// Returns the bounding box of the control polygon.
    ///
    /// The curve is always contained in this box.
    pub fn control_bounds(&self) -> Rect {
        let mut rect = Rect::from_point(self.p0);
        rect.include(self.p1);
        rect.include(self.p2);
        rect.include(self.p3);
        rect
    }

    /// Returns the bounding box of the end points.
    pub fn end_bounds(&self) -> Rect {
        let mut rect = Rect::from_point(self.p0);
        rect.include(self.p3);
        rect
    }

    /// Returns how far the control points stray from the positions they
    /// would occupy on a uniformly parameterized chord.
    ///
    /// This is zero for a line expressed as a cubic with evenly spaced
    /// control points.
    pub fn deviation(&self) -> Fixed {
        fn offset(a: Point, b: Point, c: Point) -> i64 {
            // |3a - 2b - c| in manhattan distance
            let dx = 3 * a.x.to_bits() as i64 - 2 * b.x.to_bits() as i64 - c.x.to_bits() as i64;
            let dy = 3 * a.y.to_bits() as i64 - 2 * b.y.to_bits() as i64 - c.y.to_bits() as i64;
            dx.abs() + dy.abs()
        }
        let d1 = offset(self.p1, self.p0, self.p3);
        let d2 = offset(self.p2, self.p3, self.p0);
        Fixed::from_bits((d1.max(d2) / 3).min(i32::MAX as i64) as i32)
    }
}

/// Relationship between a flattened piece of curve and the test
/// rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Region {
    /// No test rectangle, or not yet classified.
    #[default]
    Unknown,
    Inside,
    Outside,
}

/// Point reported by the flattener.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FlatPoint {
    /// End point of a flattened piece.
    pub point: Point,
    /// Containment of the piece ending at `point`.
    pub region: Region,
    /// Number of bisections that produced the piece.
    pub depth: u8,
}

/// Flattening parameters.
#[derive(Copy, Clone, Debug)]
pub struct Flattener {
    tolerance: Fixed,
    max_depth: u8,
    bounds: Option<Rect>,
}

impl Flattener {
    pub fn new(tolerance: Fixed) -> Self {
        Self {
            tolerance: tolerance.abs(),
            max_depth: MAX_DEPTH,
            bounds: None,
        }
    }

    /// Limits the number of bisection levels. Values above
    /// [`MAX_DEPTH`] are clamped.
    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth.min(MAX_DEPTH);
        self
    }

    /// Classifies each flattened piece against `bounds`.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Returns an iterator over the end points of the flattened pieces of
    /// `curve`, in curve order. The start point is not reported.
    pub fn flatten(&self, curve: Cubic) -> Flatten {
        let mut stack = [Frame::default(); STACK_SIZE];
        stack[0] = Frame {
            curve,
            depth: 0,
            region: Region::Unknown,
        };
        Flatten {
            stack,
            len: 1,
            tolerance: self.tolerance,
            max_depth: self.max_depth,
            bounds: self.bounds,
            subdivisions: 0,
        }
    }

    /// Invokes `f` for each flattened point of `curve`.
    pub fn for_each(&self, curve: Cubic, f: impl FnMut(FlatPoint)) {
        self.flatten(curve).for_each(f)
    }
}

#[derive(Copy, Clone, Default)]
struct Frame {
    curve: Cubic,
    depth: u8,
    region: Region,
}

/// Iterator produced by [`Flattener::flatten`].
#[derive(Clone)]
pub struct Flatten {
    stack: [Frame; STACK_SIZE],
    len: usize,
    tolerance: Fixed,
    max_depth: u8,
    bounds: Option<Rect>,
    subdivisions: usize,
}

impl Flatten {
    /// Number of bisections performed so far.
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    fn classify(&self, frame: &Frame) -> Region {
        let Some(bounds) = self.bounds else {
            return Region::Unknown;
        };
        // Once proven, containment is inherited by both halves.
        if frame.region != Region::Unknown {
            return frame.region;
        }
        let control = frame.curve.control_bounds();
        if bounds.contains_rect(&control) {
            Region::Inside
        } else if !bounds.intersects(&control) {
            Region::Outside
        } else {
            Region::Unknown
        }
    }
}

impl Iterator for Flatten {
    type Item = FlatPoint;

    fn next(&mut self) -> Option<Self::Item> {
        while self.len > 0 {
            self.len -= 1;
            let mut frame = self.stack[self.len];
            frame.region = self.classify(&frame);
            let is_flat = frame.curve.deviation() <= self.tolerance;
            if is_flat || frame.depth >= self.max_depth || self.len + 2 > STACK_SIZE {
                let mut region = frame.region;
                if region == Region::Unknown {
                    if let Some(bounds) = self.bounds {
                        region = if bounds.contains(frame.curve.p3) {
                            Region::Inside
                        } else {
                            Region::Outside
                        };
                    }
                }
                return Some(FlatPoint {
                    point: frame.curve.p3,
                    region,
                    depth: frame.depth,
                });
            }
            let (first, second) = frame.curve.split();
            self.subdivisions += 1;
            let depth = frame.depth + 1;
            // Push the second half first so the first half is visited first.
            self.stack[self.len] = Frame {
                curve: second,
                depth,
                region: frame.region,
            };
            self.stack[self.len + 1] = Frame {
                curve: first,
                depth,
                region: frame.region,
            };
            self.len += 2;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> Point {
        Point::new(Fixed::from_i32(x), Fixed::from_i32(y))
    }

    #[test]
    fn degenerate_line_reports_only_end_point() {
        let curve = Cubic::new(pt(0, 0), pt(100, 50), pt(200, 100), pt(300, 150));
        let mut iter = Flattener::new(Fixed::ONE).flatten(curve);
        let points = iter.by_ref().collect::<Vec<_>>();
        assert_eq!(iter.subdivisions(), 0);
        assert_eq!(
            points,
            [FlatPoint {
                point: pt(300, 150),
                region: Region::Unknown,
                depth: 0
            }]
        );
    }

    #[test]
    fn split_preserves_end_points() {
        let curve = Cubic::new(pt(0, 0), pt(0, 100), pt(100, 200), pt(200, 200));
        let (a, b) = curve.split();
        assert_eq!(a.p0, curve.p0);
        assert_eq!(a.p3, b.p0);
        assert_eq!(b.p3, curve.p3);
        // midpoint of this curve is (62.5, 137.5)
        assert_eq!(a.p3, Point::new(Fixed::from_f64(62.5), Fixed::from_f64(137.5)));
    }

    #[test]
    fn curve_points_are_ordered_and_bounded_by_depth() {
        let curve = Cubic::new(pt(0, 0), pt(0, 550), pt(450, 700), pt(700, 700));
        let flattener = Flattener::new(Fixed::from_f64(0.5));
        let mut iter = flattener.flatten(curve);
        let points = iter.by_ref().collect::<Vec<_>>();
        assert!(points.len() > 1);
        assert!(points.len() <= 1 << MAX_DEPTH);
        assert!(iter.subdivisions() < 1 << MAX_DEPTH);
        assert_eq!(points.last().unwrap().point, curve.p3);
        // x is monotonic for this curve
        for pair in points.windows(2) {
            assert!(pair[0].point.x <= pair[1].point.x);
        }
    }

    #[test]
    fn depth_limit_bounds_output() {
        let curve = Cubic::new(pt(0, 0), pt(5000, 9000), pt(-5000, 9000), pt(0, 0));
        let flattener = Flattener::new(Fixed::ZERO).with_max_depth(3);
        assert_eq!(flattener.flatten(curve).count(), 8);
    }

    #[test]
    fn classify_against_bounds() {
        // Arch rising to y = 75
        let curve = Cubic::new(pt(0, 0), pt(0, 100), pt(100, 100), pt(100, 0));
        let band = Rect::new(
            Fixed::from_i32(-1000),
            Fixed::from_i32(-10),
            Fixed::from_i32(1000),
            Fixed::from_i32(10),
        );
        let points = Flattener::new(Fixed::ONE)
            .with_bounds(band)
            .flatten(curve)
            .collect::<Vec<_>>();
        assert_eq!(points.first().unwrap().region, Region::Outside);
        assert_eq!(points.last().unwrap().region, Region::Inside);
        let roomy = Rect::new(
            Fixed::from_i32(-10),
            Fixed::from_i32(-10),
            Fixed::from_i32(110),
            Fixed::from_i32(110),
        );
        assert!(Flattener::new(Fixed::ONE)
            .with_bounds(roomy)
            .flatten(curve)
            .all(|p| p.region == Region::Inside));
    }
}
