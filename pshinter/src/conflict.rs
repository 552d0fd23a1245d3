//! Resolution of elements attached to more than one hint on an axis.
//!
//! An element may end up linked to segments of different hinted values,
//! for example a curve whose start and end both run along stem edges.
//! Values whose spans overlap cannot be active at the same time, so such a
//! conflict is resolved by dropping one of the links or by splitting a curve
//! so each half carries one of them. Disjoint values share a hint group and
//! never conflict.

use super::{
    context::GlyphContext,
    fixed::Fixed,
    geometry::Axis,
    path::{ElementId, ElementKind},
    report::Diagnostic,
    segments::{LinkId, Side},
    values::{spans_overlap, ValueId},
};

/// Two links of one element whose values overlap.
///
/// `first` is the link whose segment lies nearer the start of the element.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Conflict {
    axis: Axis,
    element: ElementId,
    first: (LinkId, ValueId),
    second: (LinkId, ValueId),
}

/// How a conflict was settled.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Resolution {
    RemovedWeak,
    RemovedStart,
    RemovedWrongSide,
    Split,
    SplitRequested,
}

/// Resolves conflicts until no element holds two overlapping hinted values
/// on one axis. Returns true if anything changed.
pub(crate) fn check_element_segments(cx: &mut GlyphContext) -> bool {
    let mut changed = false;
    for axis in Axis::ALL {
        for element in cx.path.ids() {
            changed |= drop_redundant_links(cx, axis, element);
        }
    }
    // Every step removes a link or splits a curve; the cap only matters for
    // inconsistent state.
    let limit = cx.links.len() + cx.config.max_splits + cx.path.len() + 1;
    let mut steps = 0;
    while let Some(conflict) = find_conflict(cx) {
        if steps == limit {
            cx.message(Diagnostic::PossibleLoop {
                walk: "conflict resolution",
            });
            clear_conflicts(cx);
            return true;
        }
        steps += 1;
        let resolution = try_resolve(cx, conflict);
        log::trace!(
            "{}: element {} resolved by {resolution:?}",
            conflict.axis,
            conflict.element.to_usize()
        );
        changed = true;
    }
    changed
}

/// Keeps the heaviest hinted links of every element, dropping each link
/// whose value overlaps one already kept.
pub(crate) fn clear_conflicts(cx: &mut GlyphContext) {
    for axis in Axis::ALL {
        for element in cx.path.ids() {
            let mut hinted = hinted_links(cx, axis, element);
            hinted.sort_by(|a, b| cx.value(b.1).weight.total_cmp(&cx.value(a.1).weight));
            let mut kept: Vec<ValueId> = vec![];
            for (link, value) in hinted {
                if kept.iter().any(|k| overlapping(cx, *k, value)) {
                    cx.unlink(axis, link);
                } else {
                    kept.push(value);
                }
            }
        }
    }
}

fn overlapping(cx: &GlyphContext, a: ValueId, b: ValueId) -> bool {
    a != b && spans_overlap(cx.value_span(a), cx.value_span(b), cx.config.hint_margin)
}

/// Returns the links of an element that want a hint, with their values.
fn hinted_links(cx: &GlyphContext, axis: Axis, element: ElementId) -> Vec<(LinkId, ValueId)> {
    cx.path
        .get(element)
        .links(axis)
        .iter()
        .filter_map(|link| Some((*link, cx.hint_value(axis, *link)?)))
        .collect()
}

/// Drops links that repeat a value already wanted by an earlier link.
fn drop_redundant_links(cx: &mut GlyphContext, axis: Axis, element: ElementId) -> bool {
    let mut seen: Vec<ValueId> = vec![];
    let mut changed = false;
    for (link, value) in hinted_links(cx, axis, element) {
        if seen.contains(&value) {
            cx.unlink(axis, link);
            changed = true;
        } else {
            seen.push(value);
        }
    }
    changed
}

fn find_conflict(cx: &GlyphContext) -> Option<Conflict> {
    for axis in Axis::ALL {
        for element in cx.path.ids() {
            let hinted = hinted_links(cx, axis, element);
            for (i, a) in hinted.iter().enumerate() {
                let Some(b) = hinted[i + 1..].iter().find(|b| overlapping(cx, a.1, b.1)) else {
                    continue;
                };
                let start = cx.path.start_point(element).loc(axis);
                let distance = |link: LinkId| (cx.segment(cx.link_segment(link)).loc - start).abs();
                let (first, second) = if distance(b.0) < distance(a.0) {
                    (*b, *a)
                } else {
                    (*a, *b)
                };
                return Some(Conflict {
                    axis,
                    element,
                    first,
                    second,
                });
            }
        }
    }
    None
}

fn try_resolve(cx: &mut GlyphContext, conflict: Conflict) -> Resolution {
    let Conflict {
        axis,
        element,
        first,
        second,
    } = conflict;
    let ratio = cx.config.conflict_weak_ratio;
    let (w1, w2) = (cx.value(first.1).weight, cx.value(second.1).weight);
    if w1 * ratio < w2 {
        cx.unlink(axis, first.0);
        return Resolution::RemovedWeak;
    }
    if w2 * ratio < w1 {
        cx.unlink(axis, second.0);
        return Resolution::RemovedWeak;
    }
    let start = cx.path.start_point(element);
    let end = cx.path.end_point(element);
    if cx.path.get(element).kind() != ElementKind::CurveTo && start.loc(axis) == end.loc(axis) {
        cx.unlink(axis, first.0);
        return Resolution::RemovedStart;
    }
    let before = cx.path.start_point(cx.path.prev_drawn(element)).loc(axis);
    let after = cx.path.end_point(cx.path.next_drawn(element)).loc(axis);
    let first_wrong = wrong_side(cx, first, before);
    let second_wrong = wrong_side(cx, second, after);
    if first_wrong != second_wrong {
        let link = if first_wrong { first.0 } else { second.0 };
        cx.unlink(axis, link);
        return Resolution::RemovedWrongSide;
    }
    let candidate = cx.path.get(element);
    if cx.flags.allow_edits
        && candidate.kind() == ElementKind::CurveTo
        && !candidate.is_flex()
        && candidate.conflict.is_none()
        && cx.splits < cx.config.max_splits
    {
        if let Some(half) = cx.path.split_curve(element) {
            cx.splits += 1;
            distribute_links(cx, axis, element, half, second.0);
            return Resolution::Split;
        }
    }
    cx.message(Diagnostic::SplitRequested {
        axis,
        x: end.x,
        y: end.y,
    });
    for link in cx.element_links(axis, element) {
        cx.unlink(axis, link);
    }
    Resolution::SplitRequested
}

/// Returns true if the outline next to a link leaves the stem on the side
/// opposite its body.
fn wrong_side(cx: &GlyphContext, (link, value): (LinkId, ValueId), neighbor: Fixed) -> bool {
    let margin = cx.config.hint_margin;
    let (lo, hi) = cx.value_span(value);
    match cx.segment(cx.link_segment(link)).side {
        Side::Low => neighbor < lo - margin,
        Side::High => neighbor > hi + margin,
    }
}

/// Hands links of a split curve to the half they belong to.
///
/// The second link of the conflict goes to the second half. Every other
/// link, on either axis, stays with the half whose end points come
/// nearest its segment.
fn distribute_links(
    cx: &mut GlyphContext,
    axis: Axis,
    first_half: ElementId,
    second_half: ElementId,
    moved: LinkId,
) {
    cx.move_link(axis, moved, second_half);
    for link_axis in Axis::ALL {
        for link in cx.element_links(link_axis, first_half) {
            if link_axis == axis && cx.hint_value(axis, link).is_some() {
                continue;
            }
            let loc = cx.segment(cx.link_segment(link)).loc;
            let distance = |id: ElementId| {
                let start = cx.path.start_point(id).loc(link_axis);
                let end = cx.path.end_point(id).loc(link_axis);
                (start - loc).abs().min((end - loc).abs())
            };
            if distance(second_half) < distance(first_half) {
                cx.move_link(link_axis, link, second_half);
            }
        }
    }
}
