//! Stem edge segments.
//!
//! A segment is a piece of outline that runs along the edges of an axis
//! and could bound one side of a stem. Segments are generated from lines
//! and curve handles that are close enough to axis aligned, from curves
//! that bulge past their end points and from sharp bends. Each segment is
//! attached to the path elements it came from through segment links.

use super::{
    context::GlyphContext,
    error::HintError,
    fixed::Fixed,
    flatten::{Cubic, Region},
    geometry::{self, Axis, Point, Rect},
    path::{ElementId, ElementKind},
    report::{Diagnostic, ZoneReport},
    values::ValueId,
};

/// Index of a segment in the per glyph arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SegmentId(u32);

impl SegmentId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Index of a segment link in the per glyph arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LinkId(u32);

impl LinkId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Source of a segment.
///
/// Ordered from weakest to strongest evidence of an edge.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SegmentKind {
    /// Synthetic edge opposite a segment in an alignment zone.
    Ghost,
    /// Short segment at a sharp corner.
    Bend,
    /// Flat part of a curve.
    Curve,
    /// Axis aligned line.
    Line,
}

/// Side of a stem bounded by a segment.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Side {
    /// Bottom of a horizontal stem or left of a vertical stem.
    Low,
    /// Top of a horizontal stem or right of a vertical stem.
    High,
}

/// Candidate stem edge.
#[derive(Clone, PartialEq, Debug)]
pub struct StemSegment {
    pub axis: Axis,
    /// Location across the edges of the axis.
    pub loc: Fixed,
    /// Extent along the edges of the axis.
    pub min: Fixed,
    pub max: Fixed,
    pub kind: SegmentKind,
    pub side: Side,
    /// Segment starts or ends a subpath of a glyph that receives a
    /// priority bonus.
    pub bonus: bool,
    /// Element the segment was generated from. Ghost segments have none.
    pub element: Option<ElementId>,
    /// Best stem value using this segment.
    pub(crate) best: Option<ValueId>,
    /// Segment was merged into another or discarded.
    pub(crate) removed: bool,
}

impl StemSegment {
    pub fn len(&self) -> Fixed {
        self.max - self.min
    }

    /// Returns true if the extents along the axis touch or overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Attachment of a segment to a path element.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SegmentLink {
    pub segment: SegmentId,
    pub element: ElementId,
}

/// Segments of one axis split by side, each list sorted by location.
#[derive(Clone, Default, Debug)]
pub struct SegmentLists {
    pub low: Vec<SegmentId>,
    pub high: Vec<SegmentId>,
}

impl SegmentLists {
    pub(crate) fn side_mut(&mut self, side: Side) -> &mut Vec<SegmentId> {
        match side {
            Side::Low => &mut self.low,
            Side::High => &mut self.high,
        }
    }

    pub fn len(&self) -> usize {
        self.low.len() + self.high.len()
    }
}

/// Generates, sorts and compacts the segments of one axis.
pub(crate) fn generate_segments(cx: &mut GlyphContext, axis: Axis) -> Result<(), HintError> {
    for id in cx.path.ids() {
        let element = cx.path.get(id);
        if !element.is_drawing() || element.is_duplicate() {
            continue;
        }
        let bonus = cx.flags.sol_eol && is_subpath_end(cx, id);
        match element.kind() {
            ElementKind::LineTo | ElementKind::ClosePath => line_segment(cx, axis, id, bonus),
            ElementKind::CurveTo if element.is_flex() => flex_segment(cx, axis, id, bonus),
            ElementKind::CurveTo => curve_segments(cx, axis, id, bonus),
            ElementKind::MoveTo => {}
        }
        bend_segments(cx, axis, id);
        if cx.lists[axis.index()].len() > cx.config.max_segments {
            return Err(HintError::TooManySegments {
                limit: cx.config.max_segments,
            });
        }
    }
    for side in [Side::Low, Side::High] {
        let mut list = core::mem::take(cx.lists[axis.index()].side_mut(side));
        list.sort_by_key(|id| {
            let segment = cx.segment(*id);
            (segment.loc, segment.min, segment.max)
        });
        *cx.lists[axis.index()].side_mut(side) = list;
        compact_list(cx, axis, side);
    }
    remove_extra_bends(cx, axis);
    if axis == Axis::Horizontal {
        report_extremes(cx);
    }
    log::trace!(
        "{axis} segments: {} low, {} high",
        cx.lists[axis.index()].low.len(),
        cx.lists[axis.index()].high.len()
    );
    Ok(())
}

/// Returns the side of a stem bounded by an edge travelling `direction`
/// along the axis, or `None` when it does not move along the axis.
fn side_for(cx: &GlyphContext, axis: Axis, direction: Fixed) -> Option<Side> {
    if direction == Fixed::ZERO {
        return None;
    }
    let forward = direction > Fixed::ZERO;
    // Counter-clockwise outer contours run right along bottoms and down
    // along left sides.
    let low = match axis {
        Axis::Horizontal => forward == cx.ccw,
        Axis::Vertical => forward != cx.ccw,
    };
    Some(if low { Side::Low } else { Side::High })
}

fn is_subpath_end(cx: &GlyphContext, id: ElementId) -> bool {
    let path = &cx.path;
    let start = path.subpath_start(id);
    path.get(start).next() == Some(id) || path.subpath_close(id) == id
}

fn add(
    cx: &mut GlyphContext,
    axis: Axis,
    element: ElementId,
    (loc, a, b): (Fixed, Fixed, Fixed),
    kind: SegmentKind,
    side: Side,
    bonus: bool,
) -> SegmentId {
    let segment = StemSegment {
        axis,
        loc,
        min: a.min(b),
        max: a.max(b),
        kind,
        side,
        bonus,
        element: Some(element),
        best: None,
        removed: false,
    };
    let id = cx.add_segment(segment);
    cx.link(axis, element, id);
    id
}

fn line_segment(cx: &mut GlyphContext, axis: Axis, id: ElementId, bonus: bool) {
    let from = cx.path.start_point(id);
    let to = cx.path.end_point(id);
    if from == to || geometry::axis_quotient(axis, from, to) <= 0.0 {
        return;
    }
    if from.loc(axis) != to.loc(axis) {
        cx.message(Diagnostic::NotAxisAligned {
            axis,
            from: (from.x, from.y),
            to: (to.x, to.y),
        });
    }
    let Some(side) = side_for(cx, axis, to.along(axis) - from.along(axis)) else {
        return;
    };
    let loc = from.loc(axis).midpoint(to.loc(axis));
    add(
        cx,
        axis,
        id,
        (loc, from.along(axis), to.along(axis)),
        SegmentKind::Line,
        side,
        bonus,
    );
}

/// Flex curves only produce a segment when the pair as a whole runs along
/// the axis.
fn flex_segment(cx: &mut GlyphContext, axis: Axis, id: ElementId, bonus: bool) {
    let element = cx.path.get(id);
    if !element.is_flex_start() {
        return;
    }
    let Some(second) = element.next() else {
        return;
    };
    let from = cx.path.start_point(id);
    let to = cx.path.end_point(second);
    if geometry::axis_quotient(axis, from, to) <= 0.0 {
        return;
    }
    let Some(side) = side_for(cx, axis, to.along(axis) - from.along(axis)) else {
        return;
    };
    let loc = from.loc(axis).midpoint(to.loc(axis));
    let segment = add(
        cx,
        axis,
        id,
        (loc, from.along(axis), to.along(axis)),
        SegmentKind::Curve,
        side,
        bonus,
    );
    cx.link(axis, second, segment);
}

fn curve_segments(cx: &mut GlyphContext, axis: Axis, id: ElementId, bonus: bool) {
    let Some(curve) = cx.path.cubic(id) else {
        return;
    };
    let start_aligned =
        curve.p1 != curve.p0 && geometry::axis_quotient(axis, curve.p0, curve.p1) > 0.0;
    let end_aligned =
        curve.p2 != curve.p3 && geometry::axis_quotient(axis, curve.p2, curve.p3) > 0.0;
    if start_aligned
        && end_aligned
        && geometry::axis_quotient(axis, curve.p0, curve.p3) > 0.0
        && !geometry::is_s_curve(&curve, &cx.flattener)
    {
        // The whole curve is effectively a line along the axis.
        let bounds = geometry::curve_bounds(&curve, &cx.flattener);
        let (min, max) = bounds.along_range(axis);
        let direction = curve.p3.along(axis) - curve.p0.along(axis);
        if let Some(side) = side_for(cx, axis, direction) {
            let loc = curve.p0.loc(axis).midpoint(curve.p3.loc(axis));
            add(cx, axis, id, (loc, min, max), SegmentKind::Curve, side, bonus);
        }
        return;
    }
    if start_aligned {
        flat_span(cx, axis, id, curve, false, bonus);
    }
    if end_aligned {
        flat_span(cx, axis, id, curve.reversed(), true, bonus);
    }
    extremum_segments(cx, axis, id, curve, bonus);
}

/// Adds a segment covering the part of `curve` that stays near the
/// location of its start point. When `reversed` is true the curve was
/// reversed and the element actually travels the opposite way.
fn flat_span(
    cx: &mut GlyphContext,
    axis: Axis,
    id: ElementId,
    curve: Cubic,
    reversed: bool,
    bonus: bool,
) {
    let loc = curve.p0.loc(axis);
    let band = cx.config.curve_band;
    let flattener = cx
        .flattener
        .with_bounds(Rect::band(axis, loc - band, loc + band));
    let start = curve.p0.along(axis);
    let mut reach = start;
    for flat in flattener.flatten(curve) {
        if flat.region == Region::Outside {
            break;
        }
        reach = flat.point.along(axis);
    }
    // The handle governs short flats.
    let handle = start.midpoint(curve.p1.along(axis));
    if (handle - start).abs() > (reach - start).abs() {
        reach = handle;
    }
    let mut direction = reach - start;
    if reversed {
        direction = -direction;
    }
    if let Some(side) = side_for(cx, axis, direction) {
        add(
            cx,
            axis,
            id,
            (loc, start, reach),
            SegmentKind::Curve,
            side,
            bonus,
        );
    }
}

/// Adds segments where a curve bulges past both of its end points.
fn extremum_segments(cx: &mut GlyphContext, axis: Axis, id: ElementId, curve: Cubic, bonus: bool) {
    let (end_lo, end_hi) = curve.end_bounds().loc_range(axis);
    let (ctl_lo, ctl_hi) = curve.control_bounds().loc_range(axis);
    let band = cx.config.curve_band;
    if ctl_lo >= end_lo - band && ctl_hi <= end_hi + band {
        return;
    }
    let points = core::iter::once(curve.p0)
        .chain(cx.flattener.flatten(curve).map(|flat| flat.point))
        .collect::<Vec<_>>();
    for high in [false, true] {
        let extreme = points.iter().enumerate().max_by_key(|(_, p)| {
            if high {
                p.loc(axis)
            } else {
                -p.loc(axis)
            }
        });
        let Some((index, extreme)) = extreme else {
            continue;
        };
        let ext = extreme.loc(axis);
        let clears = if high {
            ext - end_hi > band
        } else {
            end_lo - ext > band
        };
        if !clears {
            continue;
        }
        let near = |p: &Point| (p.loc(axis) - ext).abs() <= band;
        let mut first = index;
        while first > 0 && near(&points[first - 1]) {
            first -= 1;
        }
        let mut last = index;
        while last + 1 < points.len() && near(&points[last + 1]) {
            last += 1;
        }
        let mut min = Fixed::MAX;
        let mut max = Fixed::MIN;
        for p in &points[first..=last] {
            min = min.min(p.along(axis));
            max = max.max(p.along(axis));
        }
        if min == max {
            let half = cx.config.bend_length.half();
            min -= half;
            max += half;
        }
        let mut direction = points[last].along(axis) - points[first].along(axis);
        if direction == Fixed::ZERO {
            direction = curve.p3.along(axis) - curve.p0.along(axis);
        }
        if let Some(side) = side_for(cx, axis, direction) {
            add(cx, axis, id, (ext, min, max), SegmentKind::Curve, side, bonus);
        }
    }
}

/// Tangent leaving the start of an element.
fn tangent_out(cx: &GlyphContext, id: ElementId) -> Point {
    let start = cx.path.start_point(id);
    let end = cx.path.end_point(id);
    let towards = match cx.path.get(id).controls() {
        Some((c0, c1)) => [c0, c1, end].into_iter().find(|p| *p != start),
        None => Some(end),
    };
    towards.map(|p| p - start).unwrap_or_default()
}

/// Tangent arriving at the end of an element.
fn tangent_in(cx: &GlyphContext, id: ElementId) -> Point {
    let start = cx.path.start_point(id);
    let end = cx.path.end_point(id);
    let from = match cx.path.get(id).controls() {
        Some((c0, c1)) => [c1, c0, start].into_iter().find(|p| *p != end),
        None => Some(start),
    };
    from.map(|p| end - p).unwrap_or_default()
}

/// Adds bend segments at the junction following `id` when the outline
/// reverses direction across the axis there.
fn bend_segments(cx: &mut GlyphContext, axis: Axis, id: ElementId) {
    let element = cx.path.get(id);
    if element.is_flex_start() {
        return;
    }
    let incoming = tangent_in(cx, id);
    if incoming == Point::default() {
        return;
    }
    // Skip zero length elements such as a close at the start point.
    let mut next = cx.path.next_drawn(id);
    let mut outgoing = tangent_out(cx, next);
    for _ in 0..cx.path.len() {
        if outgoing != Point::default() || next == id {
            break;
        }
        next = cx.path.next_drawn(next);
        outgoing = tangent_out(cx, next);
    }
    if outgoing == Point::default() {
        return;
    }
    let corner = cx.path.end_point(id);
    if axis == Axis::Horizontal && !geometry::is_smooth_join(incoming, outgoing) {
        let degrees = geometry::corner_angle(incoming, outgoing);
        if degrees < cx.config.sharp_angle {
            cx.message(Diagnostic::SharpAngle {
                x: corner.x,
                y: corner.y,
                degrees,
            });
        }
    }
    if !incoming.loc(axis).opposite_sign(outgoing.loc(axis)) {
        return;
    }
    let along_in = incoming.along(axis);
    let along_out = outgoing.along(axis);
    let half = cx.config.bend_length.half();
    let at = corner.along(axis);
    let span = (corner.loc(axis), at - half, at + half);
    let direction = if along_in.opposite_sign(along_out) {
        Fixed::ZERO
    } else {
        along_in + along_out
    };
    match side_for(cx, axis, direction) {
        Some(side) => {
            add(cx, axis, id, span, SegmentKind::Bend, side, false);
        }
        None => {
            // Ambiguous direction: the corner may bound either side.
            add(cx, axis, id, span, SegmentKind::Bend, Side::Low, false);
            add(cx, axis, id, span, SegmentKind::Bend, Side::High, false);
        }
    }
}

/// Merges segments of one list that share a location and overlap. The
/// wider segment survives, takes the union of both extents and inherits
/// the links of the other.
fn compact_list(cx: &mut GlyphContext, axis: Axis, side: Side) {
    let tolerance = cx.config.compact_tolerance;
    let mut list = core::mem::take(cx.lists[axis.index()].side_mut(side));
    let mut i = 0;
    while i < list.len() {
        let mut j = i + 1;
        while j < list.len() {
            let (a, b) = (cx.segment(list[i]), cx.segment(list[j]));
            if b.loc - a.loc > tolerance {
                break;
            }
            if !a.overlaps(b) {
                j += 1;
                continue;
            }
            let (keep, drop) = if a.len() >= b.len() {
                (list[i], list[j])
            } else {
                (list[j], list[i])
            };
            let dropped = cx.segment(drop).clone();
            let kept = cx.segment_mut(keep);
            kept.min = kept.min.min(dropped.min);
            kept.max = kept.max.max(dropped.max);
            kept.kind = kept.kind.max(dropped.kind);
            kept.bonus |= dropped.bonus;
            cx.replace_segment(drop, keep);
            list[i] = keep;
            list.remove(j);
            // The wider span may now overlap segments already passed over.
            j = i + 1;
        }
        i += 1;
    }
    *cx.lists[axis.index()].side_mut(side) = list;
}

/// Discards a bend that is co-located with a much longer non-bend segment
/// of the opposite list, or the reverse.
fn remove_extra_bends(cx: &mut GlyphContext, axis: Axis) {
    let ratio = cx.config.extra_bend_ratio;
    let lists = cx.lists[axis.index()].clone();
    for &low in &lists.low {
        for &high in &lists.high {
            let (a, b) = (cx.segment(low), cx.segment(high));
            if a.removed || b.removed || a.loc != b.loc || !a.overlaps(b) {
                continue;
            }
            let (len_a, len_b) = (a.len().to_f64(), b.len().to_f64());
            let a_bend = a.kind == SegmentKind::Bend;
            let b_bend = b.kind == SegmentKind::Bend;
            if a_bend && !b_bend && len_b > len_a * ratio {
                cx.remove_segment(low);
            } else if b_bend && !a_bend && len_a > len_b * ratio {
                cx.remove_segment(high);
            }
        }
    }
}

/// Reports the highest top edge and lowest bottom edge of the glyph.
fn report_extremes(cx: &mut GlyphContext) {
    let lists = &cx.lists[Axis::Horizontal.index()];
    let top = lists
        .high
        .iter()
        .map(|id| cx.segment(*id))
        .filter(|s| s.kind != SegmentKind::Bend)
        .max_by_key(|s| s.loc)
        .map(|s| ZoneReport {
            top: true,
            loc: s.loc,
            min: s.min,
            max: s.max,
        });
    let bottom = lists
        .low
        .iter()
        .map(|id| cx.segment(*id))
        .filter(|s| s.kind != SegmentKind::Bend)
        .min_by_key(|s| s.loc)
        .map(|s| ZoneReport {
            top: false,
            loc: s.loc,
            min: s.min,
            max: s.max,
        });
    for report in [top, bottom].into_iter().flatten() {
        cx.reporter.report_zone(&report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GlyphFlags, HintConfig},
        context::tests::path_from_svg,
    };

    fn segments(svg: &str, axis: Axis) -> Vec<(Side, SegmentKind, f64, f64, f64)> {
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = GlyphContext::new(
            path_from_svg(svg),
            &config,
            GlyphFlags::default(),
            &mut reporter,
        );
        generate_segments(&mut cx, axis).unwrap();
        let lists = &cx.lists[axis.index()];
        lists
            .low
            .iter()
            .chain(&lists.high)
            .map(|id| {
                let s = cx.segment(*id);
                (s.side, s.kind, s.loc.to_f64(), s.min.to_f64(), s.max.to_f64())
            })
            .collect()
    }

    #[test]
    fn rectangle_edges() {
        let rect = "M0 0 L100 0 L100 100 L0 100 Z";
        assert_eq!(
            segments(rect, Axis::Horizontal),
            [
                (Side::Low, SegmentKind::Line, 0.0, 0.0, 100.0),
                (Side::High, SegmentKind::Line, 100.0, 0.0, 100.0),
            ]
        );
        assert_eq!(
            segments(rect, Axis::Vertical),
            [
                (Side::Low, SegmentKind::Line, 0.0, 0.0, 100.0),
                (Side::High, SegmentKind::Line, 100.0, 0.0, 100.0),
            ]
        );
    }

    #[test]
    fn clockwise_rectangle_edges() {
        // Same sides regardless of winding when only one contour exists
        let rect = "M0 0 L0 100 L100 100 L100 0 Z";
        assert_eq!(
            segments(rect, Axis::Horizontal),
            [
                (Side::Low, SegmentKind::Line, 0.0, 0.0, 100.0),
                (Side::High, SegmentKind::Line, 100.0, 0.0, 100.0),
            ]
        );
    }

    #[test]
    fn diamond_bends() {
        let diamond = "M250 0 L500 350 L250 700 L0 350 Z";
        assert_eq!(
            segments(diamond, Axis::Horizontal),
            [
                (Side::Low, SegmentKind::Bend, 0.0, 249.0, 251.0),
                (Side::High, SegmentKind::Bend, 700.0, 249.0, 251.0),
            ]
        );
        assert_eq!(
            segments(diamond, Axis::Vertical),
            [
                (Side::Low, SegmentKind::Bend, 0.0, 349.0, 351.0),
                (Side::High, SegmentKind::Bend, 500.0, 349.0, 351.0),
            ]
        );
    }

    #[test]
    fn round_bowl() {
        // Circle-like outline with points at the extrema
        let o = "M250 0 C380 0 480 160 480 350 C480 540 380 700 250 700 \
                 C120 700 20 540 20 350 C20 160 120 0 250 0 Z";
        let h = segments(o, Axis::Horizontal);
        assert_eq!(h.len(), 2);
        assert_eq!((h[0].0, h[0].2), (Side::Low, 0.0));
        assert_eq!((h[1].0, h[1].2), (Side::High, 700.0));
        // compacted from the two quarter curves meeting at the extremum
        assert!(h[0].3 < 250.0 && h[0].4 > 250.0);
        let v = segments(o, Axis::Vertical);
        assert_eq!(v.len(), 2);
        assert_eq!((v[0].0, v[0].2), (Side::Low, 20.0));
        assert_eq!((v[1].0, v[1].2), (Side::High, 480.0));
    }

    #[test]
    fn bulging_curve_extremum() {
        // Arch whose control handles are not axis aligned
        let arch = "M0 0 C30 120 170 120 200 0 Z";
        let h = segments(arch, Axis::Horizontal);
        // the top of the arch and the base line
        assert!(h
            .iter()
            .any(|s| s.0 == Side::High && s.1 == SegmentKind::Curve && s.2 > 85.0 && s.2 <= 90.0));
        assert!(h.iter().any(|s| s.1 == SegmentKind::Line && s.2 == 0.0));
    }

    #[test]
    fn flex_pair_emits_one_segment() {
        let mut path =
            path_from_svg("M0 0 L600 0 L600 100 C450 100 400 98 300 98 C200 98 150 100 0 100 Z");
        let ids = path.ids();
        assert!(path.mark_flex(ids[3]));
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = GlyphContext::new(path, &config, GlyphFlags::default(), &mut reporter);
        generate_segments(&mut cx, Axis::Horizontal).unwrap();
        let high = &cx.lists[0].high;
        assert_eq!(high.len(), 1);
        let top = cx.segment(high[0]);
        assert_eq!(top.loc, Fixed::from_i32(100));
        assert_eq!((top.min, top.max), (Fixed::ZERO, Fixed::from_i32(600)));
        // both halves of the flex carry the link
        assert_eq!(cx.path.get(ids[3]).links(Axis::Horizontal).len(), 1);
        assert_eq!(cx.path.get(ids[4]).links(Axis::Horizontal).len(), 1);
    }

    #[test]
    fn segment_limit() {
        let config = HintConfig {
            max_segments: 1,
            ..Default::default()
        };
        let mut reporter = ();
        let mut cx = GlyphContext::new(
            path_from_svg("M0 0 L100 0 L100 100 L0 100 Z"),
            &config,
            GlyphFlags::default(),
            &mut reporter,
        );
        assert_eq!(
            generate_segments(&mut cx, Axis::Horizontal),
            Err(HintError::TooManySegments { limit: 1 })
        );
    }
}
