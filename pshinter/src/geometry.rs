//! Points, rectangles and the geometric predicates used to classify
//! outline elements.

use super::{
    fixed::Fixed,
    flatten::{Cubic, Flattener},
};
use core::ops::{Add, Sub};

/// Hint axis.
///
/// Horizontal hints constrain y locations of horizontal edges, vertical
/// hints constrain x locations of vertical edges.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const ALL: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// Index for per axis tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal)
    }
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}

/// Point or vector in font units.
#[derive(Copy, Clone, PartialEq, Eq, Default, Hash, Debug)]
pub struct Point {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point {
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Location measured across the edges of `axis`: y for horizontal
    /// hints and x for vertical hints.
    pub fn loc(self, axis: Axis) -> Fixed {
        match axis {
            Axis::Horizontal => self.y,
            Axis::Vertical => self.x,
        }
    }

    /// Coordinate measured along the edges of `axis`.
    pub fn along(self, axis: Axis) -> Fixed {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Creates a point from a location and a coordinate along the edges of
    /// `axis`.
    pub fn from_loc(axis: Axis, loc: Fixed, along: Fixed) -> Self {
        match axis {
            Axis::Horizontal => Self::new(along, loc),
            Axis::Vertical => Self::new(loc, along),
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new(self.x.midpoint(other.x), self.y.midpoint(other.y))
    }

    /// Cross product, in raw fixed point units squared.
    pub fn cross(self, other: Self) -> i64 {
        self.x.to_bits() as i64 * other.y.to_bits() as i64
            - self.y.to_bits() as i64 * other.x.to_bits() as i64
    }

    /// Dot product, in raw fixed point units squared.
    pub fn dot(self, other: Self) -> i64 {
        self.x.to_bits() as i64 * other.x.to_bits() as i64
            + self.y.to_bits() as i64 * other.y.to_bits() as i64
    }

    /// Returns the point with y negated.
    pub fn flip_y(self) -> Self {
        Self::new(self.x, -self.y)
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis aligned rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Rect {
    pub x_min: Fixed,
    pub y_min: Fixed,
    pub x_max: Fixed,
    pub y_max: Fixed,
}

impl Rect {
    pub const fn new(x_min: Fixed, y_min: Fixed, x_max: Fixed, y_max: Fixed) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Rectangle covering `lo..=hi` across the edges of `axis` and
    /// unbounded along them.
    pub fn band(axis: Axis, lo: Fixed, hi: Fixed) -> Self {
        let min = Point::from_loc(axis, lo, Fixed::MIN);
        let max = Point::from_loc(axis, hi, Fixed::MAX);
        Self::new(min.x, min.y, max.x, max.y)
    }

    pub fn include(&mut self, point: Point) {
        self.x_min = self.x_min.min(point.x);
        self.y_min = self.y_min.min(point.y);
        self.x_max = self.x_max.max(point.x);
        self.y_max = self.y_max.max(point.y);
    }

    pub fn union(&mut self, other: &Self) {
        self.include(Point::new(other.x_min, other.y_min));
        self.include(Point::new(other.x_max, other.y_max));
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x_min >= self.x_min
            && other.x_max <= self.x_max
            && other.y_min >= self.y_min
            && other.y_max <= self.y_max
    }

    pub fn intersects(&self, other: &Self) -> bool {
        other.x_min <= self.x_max
            && other.x_max >= self.x_min
            && other.y_min <= self.y_max
            && other.y_max >= self.y_min
    }

    /// Range of locations across the edges of `axis`.
    pub fn loc_range(&self, axis: Axis) -> (Fixed, Fixed) {
        match axis {
            Axis::Horizontal => (self.y_min, self.y_max),
            Axis::Vertical => (self.x_min, self.x_max),
        }
    }

    /// Range of coordinates along the edges of `axis`.
    pub fn along_range(&self, axis: Axis) -> (Fixed, Fixed) {
        match axis {
            Axis::Horizontal => (self.x_min, self.x_max),
            Axis::Vertical => (self.y_min, self.y_max),
        }
    }
}

/// Spread over which the alignment quotient decays from 1 to 0.
const QUOTIENT_THETA: f64 = 0.38;

/// Measures how well the chord `from -> to` lines up with the edges of
/// `axis`.
///
/// Returns 1.0 for an exactly aligned chord, decaying continuously to 0.0
/// as the chord tilts away. Zero length chords return 0.0.
pub fn axis_quotient(axis: Axis, from: Point, to: Point) -> f64 {
    let delta = to - from;
    quotient(
        delta.loc(axis).abs().to_f64(),
        delta.along(axis).abs().to_f64(),
    )
}

fn quotient(across: f64, along: f64) -> f64 {
    if along == 0.0 {
        return 0.0;
    }
    if across == 0.0 {
        return 1.0;
    }
    let q = across * across / (QUOTIENT_THETA * along);
    if q < 0.25 {
        1.0
    } else if q < 1.0 {
        (1.0 - q) * 4.0 / 3.0
    } else {
        0.0
    }
}

/// Cheap approximation of the length of a vector.
pub fn approx_length(vector: Point) -> Fixed {
    let x = vector.x.abs().to_bits();
    let y = vector.y.abs().to_bits();
    Fixed::from_bits(if x > y {
        x.saturating_add((3 * (y as i64) >> 3) as i32)
    } else {
        y.saturating_add((3 * (x as i64) >> 3) as i32)
    })
}

/// Returns true if the element `from -> to` is shorter than `limit`.
pub fn is_short(from: Point, to: Point, limit: Fixed) -> bool {
    approx_length(to - from) < limit
}

/// Returns true if both components of `from -> to` are below `limit`.
pub fn is_tiny(from: Point, to: Point, limit: Fixed) -> bool {
    let delta = to - from;
    delta.x.abs() < limit && delta.y.abs() < limit
}

/// Returns true if the incoming and outgoing tangents at a junction are
/// nearly collinear and point the same way.
pub fn is_smooth_join(incoming: Point, outgoing: Point) -> bool {
    if incoming == Point::default() || outgoing == Point::default() {
        return true;
    }
    if incoming.dot(outgoing) <= 0 {
        return false;
    }
    let sum = incoming + outgoing;
    let d_in = approx_length(incoming).to_bits() as i64;
    let d_out = approx_length(outgoing).to_bits() as i64;
    let d_sum = approx_length(sum).to_bits() as i64;
    (d_in + d_out - d_sum) < (d_sum >> 4)
}

/// Returns the interior angle, in degrees, at a junction with the given
/// incoming and outgoing tangents.
///
/// A straight continuation measures 180 degrees; a path that doubles back
/// measures close to 0.
pub fn corner_angle(incoming: Point, outgoing: Point) -> f64 {
    let back = Point::new(-incoming.x, -incoming.y);
    let (bx, by) = (back.x.to_f64(), back.y.to_f64());
    let (ox, oy) = (outgoing.x.to_f64(), outgoing.y.to_f64());
    let cross = bx * oy - by * ox;
    let dot = bx * ox + by * oy;
    cross.abs().atan2(dot).to_degrees()
}

/// Returns the tight bounding box of a cubic.
///
/// When all control points lie within the box of the end points this is
/// exact; otherwise the curve is flattened to find its extrema.
pub fn curve_bounds(curve: &Cubic, flattener: &Flattener) -> Rect {
    let mut rect = curve.end_bounds();
    if rect.contains(curve.p1) && rect.contains(curve.p2) {
        return rect;
    }
    flattener.for_each(*curve, |flat| rect.include(flat.point));
    rect
}

/// Returns true if the curve changes its direction of turn, as an S shape
/// does.
pub fn is_s_curve(curve: &Cubic, flattener: &Flattener) -> bool {
    let mut prev_point = curve.p0;
    let mut prev_dir: Option<Point> = None;
    let mut turn = 0i64;
    let mut changed = false;
    flattener.for_each(*curve, |flat| {
        let dir = flat.point - prev_point;
        if dir == Point::default() {
            return;
        }
        if let Some(prev) = prev_dir {
            let cross = prev.cross(dir);
            if cross != 0 {
                if turn != 0 && (turn < 0) != (cross < 0) {
                    changed = true;
                }
                turn = cross;
            }
        }
        prev_dir = Some(dir);
        prev_point = flat.point;
    });
    changed
}

/// Signed area of a closed polygon, positive for counter-clockwise
/// winding in a y-up coordinate system. Returned in raw fixed point units
/// squared, doubled.
pub fn signed_area(points: impl IntoIterator<Item = Point>) -> i64 {
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return 0;
    };
    let mut area = 0i64;
    let mut prev = first;
    for point in iter {
        area += prev.cross(point);
        prev = point;
    }
    area + prev.cross(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> Point {
        Point::new(Fixed::from_i32(x), Fixed::from_i32(y))
    }

    #[test]
    fn quotients() {
        let h = Axis::Horizontal;
        let v = Axis::Vertical;
        assert_eq!(axis_quotient(h, pt(0, 0), pt(100, 0)), 1.0);
        assert_eq!(axis_quotient(v, pt(0, 0), pt(100, 0)), 0.0);
        assert_eq!(axis_quotient(v, pt(0, 0), pt(0, -100)), 1.0);
        // one unit of rise over 100 is still treated as flat
        assert_eq!(axis_quotient(h, pt(0, 0), pt(100, 1)), 1.0);
        // five units of rise over 100 is partially aligned
        let q = axis_quotient(h, pt(0, 0), pt(100, 5));
        assert!(q > 0.0 && q < 1.0);
        assert_eq!(axis_quotient(h, pt(0, 0), pt(100, 10)), 0.0);
        assert_eq!(axis_quotient(h, pt(5, 5), pt(5, 5)), 0.0);
    }

    #[test]
    fn short_and_tiny() {
        assert!(is_short(pt(0, 0), pt(2, 2), Fixed::from_i32(4)));
        assert!(!is_short(pt(0, 0), pt(4, 0), Fixed::from_i32(4)));
        assert!(is_tiny(pt(0, 0), pt(1, -1), Fixed::from_i32(2)));
        assert!(!is_tiny(pt(0, 0), pt(0, 3), Fixed::from_i32(2)));
    }

    #[test]
    fn smooth_and_sharp_joins() {
        assert!(is_smooth_join(pt(100, 0), pt(50, 1)));
        assert!(!is_smooth_join(pt(100, 0), pt(0, 100)));
        assert!(!is_smooth_join(pt(100, 0), pt(-100, 0)));
        assert!((corner_angle(pt(100, 0), pt(0, 100)) - 90.0).abs() < 1e-9);
        assert!((corner_angle(pt(100, 0), pt(100, 0)) - 180.0).abs() < 1e-9);
        assert!(corner_angle(pt(100, 0), pt(-100, 5)) < 5.0);
    }

    #[test]
    fn bounds_of_bulging_curve() {
        let curve = Cubic::new(pt(0, 0), pt(0, 100), pt(100, 100), pt(100, 0));
        let rect = curve_bounds(&curve, &Flattener::new(Fixed::from_f64(0.25)));
        assert_eq!(rect.loc_range(Axis::Horizontal).0, Fixed::ZERO);
        // true maximum is 75
        let top = rect.y_max.to_f64();
        assert!(top > 74.0 && top <= 75.0, "{top}");
    }

    #[test]
    fn s_curves() {
        let flattener = Flattener::new(Fixed::from_f64(0.5));
        let arch = Cubic::new(pt(0, 0), pt(0, 100), pt(100, 100), pt(100, 0));
        assert!(!is_s_curve(&arch, &flattener));
        let s = Cubic::new(pt(0, 0), pt(100, 100), pt(0, 100), pt(100, 200));
        assert!(is_s_curve(&s, &flattener));
    }

    #[test]
    fn orientation() {
        let ccw = [pt(0, 0), pt(100, 0), pt(100, 100), pt(0, 100)];
        assert!(signed_area(ccw) > 0);
        assert!(signed_area(ccw.into_iter().rev()) < 0);
    }
}
