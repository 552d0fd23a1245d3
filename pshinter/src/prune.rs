//! Removal of stem candidates dominated by stronger nearby candidates.

use super::{
    context::GlyphContext,
    eval::live_values,
    geometry::Axis,
    path::ElementId,
    report::Diagnostic,
    segments::{SegmentId, SegmentKind},
    values::{StemValue, ValueId},
};

/// Marks values dominated by another value of the same axis as pruned.
///
/// All decisions are made against the values that were live on entry and
/// applied together afterwards, so pruning twice changes nothing.
pub(crate) fn prune_values(cx: &mut GlyphContext, axis: Axis) {
    let ids = live_values(cx, axis);
    let mut doomed = vec![];
    for &a in &ids {
        if is_dominated(cx, &ids, a) {
            doomed.push(a);
        }
    }
    log::debug!("{axis}: pruned {} of {} values", doomed.len(), ids.len());
    for id in doomed {
        cx.value_mut(id).pruned = true;
    }
}

fn is_dominated(cx: &mut GlyphContext, ids: &[ValueId], a: ValueId) -> bool {
    let factor = cx.config.prune_factor;
    let margin = cx.config.prune_margin;
    let va = cx.value(a).clone();
    for &b in ids {
        if b == a {
            continue;
        }
        let vb = cx.value(b).clone();
        // Rule 1: a much stronger value nearly covering this one, joined
        // to it along the outline on both sides.
        if vb.weight > va.weight * factor
            && vb.priority >= va.priority
            && vb.lo <= va.lo + margin
            && vb.hi >= va.hi - margin
            && close_in_path(cx, va.seg_lo, vb.seg_lo)
            && close_in_path(cx, va.seg_hi, vb.seg_hi)
        {
            return true;
        }
        // Rule 2: a bend standing in for a real edge next to it.
        if vb.weight > va.weight && bend_beside_edge(cx, &va, &vb) {
            return true;
        }
    }
    // Rule 3: beaten on both edges by different values.
    if va.ghost {
        return false;
    }
    let beats = |b: ValueId, shared: fn(&StemValue) -> SegmentId| {
        let vb = cx.value(b);
        b != a
            && shared(vb) == shared(&va)
            && vb.weight > va.weight * factor
            && vb.priority >= va.priority
    };
    let low_side = ids.iter().any(|b| beats(*b, |v| v.seg_lo));
    let high_side = ids.iter().any(|b| beats(*b, |v| v.seg_hi));
    low_side && high_side
}

/// Returns true if `a` and `b` share one segment and the other segment of
/// `a` is a bend lying on the other, non-bend, segment of `b`.
fn bend_beside_edge(cx: &GlyphContext, a: &StemValue, b: &StemValue) -> bool {
    let (other_a, other_b) = if a.seg_lo == b.seg_lo && a.seg_hi != b.seg_hi {
        (a.seg_hi, b.seg_hi)
    } else if a.seg_hi == b.seg_hi && a.seg_lo != b.seg_lo {
        (a.seg_lo, b.seg_lo)
    } else {
        return false;
    };
    let (sa, sb) = (cx.segment(other_a), cx.segment(other_b));
    sa.kind == SegmentKind::Bend
        && sb.kind != SegmentKind::Bend
        && sb.kind != SegmentKind::Ghost
        && (sa.loc - sb.loc).abs() <= cx.config.bend_merge_tolerance
}

/// Returns the elements a segment is attached to.
fn segment_elements(cx: &GlyphContext, id: SegmentId) -> Vec<ElementId> {
    let segment = cx.segment(id);
    let axis = segment.axis;
    let mut elements = segment.element.into_iter().collect::<Vec<_>>();
    for (index, link) in cx.links.iter().enumerate() {
        if link.segment == id
            && !elements.contains(&link.element)
            && cx
                .path
                .get(link.element)
                .links(axis)
                .iter()
                .any(|l| l.to_usize() == index)
        {
            elements.push(link.element);
        }
    }
    elements
}

/// Returns true if the outline can be followed from segment `a` to
/// segment `b` without leaving the band between their locations.
///
/// The walk is tried in both directions and stops when it wraps around to
/// where it started. Ghost segments are never close to anything but
/// themselves.
pub(crate) fn close_in_path(cx: &mut GlyphContext, a: SegmentId, b: SegmentId) -> bool {
    if a == b {
        return true;
    }
    let (seg_a, seg_b) = (cx.segment(a), cx.segment(b));
    let Some(start) = seg_a.element else {
        return false;
    };
    if seg_b.element.is_none() {
        return false;
    }
    let axis = seg_a.axis;
    let margin = cx.config.prune_margin;
    let lo = seg_a.loc.min(seg_b.loc) - margin;
    let hi = seg_a.loc.max(seg_b.loc) + margin;
    let targets = segment_elements(cx, b);
    if segment_elements(cx, a).iter().any(|e| targets.contains(e)) {
        return true;
    }
    let limit = cx.path.len();
    for forward in [true, false] {
        let mut cur = start;
        let mut steps = 0;
        loop {
            cur = if forward {
                cx.path.next_drawn(cur)
            } else {
                cx.path.prev_drawn(cur)
            };
            if targets.contains(&cur) {
                return true;
            }
            if cur == start {
                break;
            }
            steps += 1;
            if steps > limit {
                cx.message(Diagnostic::PossibleLoop {
                    walk: "close segment search",
                });
                break;
            }
            let point = if forward {
                cx.path.end_point(cur)
            } else {
                cx.path.start_point(cur)
            };
            let loc = point.loc(axis);
            if loc < lo || loc > hi {
                break;
            }
        }
    }
    false
}
