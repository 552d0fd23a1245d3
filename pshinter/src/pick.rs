//! Greedy selection of a non-overlapping set of stems.

use super::{
    context::GlyphContext,
    eval::live_values,
    fixed::Fixed,
    geometry::Axis,
    report::Diagnostic,
    segments::{SegmentId, SegmentKind},
    values::{compare_values, spans_overlap, ValueId},
};

/// Picks the coloring of one axis.
///
/// The best remaining value is taken and every value overlapping it is
/// discarded until nothing remains. After the first pick, values without
/// priority must be heavy in absolute terms or within `admit_ratio` of the
/// previous pick to be admitted.
pub(crate) fn pick_values(cx: &mut GlyphContext, axis: Axis) {
    let config = cx.config;
    let mut remaining = live_values(cx, axis);
    let mut picked: Vec<ValueId> = vec![];
    let mut prev_weight: Option<f64> = None;
    while let Some(index) = best_index(cx, &remaining) {
        let id = remaining.remove(index);
        let value = cx.value(id);
        if let Some(prev) = prev_weight {
            if value.priority == 0
                && value.weight < config.weight_floor
                && value.weight * config.admit_ratio < prev
            {
                log::trace!("{axis}: rejected weak value {}..{}", value.lo, value.hi);
                continue;
            }
        }
        let chosen = if value.ghost {
            substitute_ghost(cx, id, &picked).unwrap_or(id)
        } else {
            id
        };
        let spans = [cx.value_span(id), cx.value_span(chosen)];
        remaining.retain(|other| {
            let span = cx.value_span(*other);
            !spans
                .iter()
                .any(|picked| spans_overlap(*picked, span, config.hint_margin))
        });
        if !picked.contains(&chosen) {
            picked.push(chosen);
        }
        prev_weight = Some(cx.value(chosen).weight);
    }
    picked.sort_by_key(|id| (cx.value(*id).lo, cx.value(*id).hi));
    log::debug!("{axis}: picked {} values", picked.len());
    claim_edges(cx, axis, &picked);
    cx.coloring[axis.index()] = picked;
}

/// Points every segment of a value represented by one of `picked` at its
/// representative, so the elements along those edges are hinted with it.
pub(crate) fn claim_edges(cx: &mut GlyphContext, axis: Axis, picked: &[ValueId]) {
    for id in cx.candidates[axis.index()].clone() {
        let rep = cx.representative(id);
        if picked.contains(&rep) {
            let value = cx.value(id);
            for seg in [value.seg_lo, value.seg_hi] {
                cx.segment_mut(seg).best = Some(rep);
            }
        }
    }
}

fn best_index(cx: &GlyphContext, ids: &[ValueId]) -> Option<usize> {
    let factor = cx.config.priority_factor;
    let shift = cx.config.ghost_shift;
    let mut best: Option<usize> = None;
    for (index, id) in ids.iter().enumerate() {
        match best {
            Some(current)
                if !compare_values(cx.value(*id), cx.value(ids[current]), factor, shift) => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Returns the real segment of a ghost value.
fn real_segment(cx: &GlyphContext, id: ValueId) -> SegmentId {
    let value = cx.value(id);
    if cx.segment(value.seg_lo).kind == SegmentKind::Ghost {
        value.seg_hi
    } else {
        value.seg_lo
    }
}

/// Finds a real value sharing the real edge of a ghost that is strong
/// enough to take its place and fits with the values already picked.
fn substitute_ghost(cx: &GlyphContext, ghost: ValueId, picked: &[ValueId]) -> Option<ValueId> {
    let config = cx.config;
    let segment = real_segment(cx, ghost);
    let axis = cx.value(ghost).axis;
    let mut best: Option<ValueId> = None;
    for &id in &cx.candidates[axis.index()] {
        let value = cx.value(id);
        if value.ghost
            || value.pruned
            || value.init_weight < config.ghost_substitute_weight
            || (value.seg_lo != segment && value.seg_hi != segment)
        {
            continue;
        }
        let rep = cx.representative(id);
        let span = cx.value_span(rep);
        if picked
            .iter()
            .any(|p| spans_overlap(cx.value_span(*p), span, config.hint_margin))
        {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => compare_values(
                cx.value(rep),
                cx.value(current),
                config.priority_factor,
                config.ghost_shift,
            ),
        };
        if better {
            best = Some(rep);
        }
    }
    best
}

/// Returns stems covering the bounding boxes of the glyph on one axis.
///
/// Subpaths whose extents do not overlap each get their own stem;
/// otherwise a single stem covers the whole glyph.
pub(crate) fn bbox_fallback(cx: &mut GlyphContext, axis: Axis) -> Vec<(Fixed, Fixed)> {
    let subpaths = cx
        .path
        .subpaths()
        .into_iter()
        .filter(|subpath| !cx.path.get(subpath.close).is_duplicate())
        .collect::<Vec<_>>();
    let mut ranges = subpaths
        .iter()
        .map(|subpath| {
            cx.path
                .subpath_bounds(*subpath, &cx.flattener)
                .loc_range(axis)
        })
        .collect::<Vec<_>>();
    ranges.sort();
    let disjoint = ranges.windows(2).all(|pair| pair[0].1 < pair[1].0);
    if !disjoint {
        ranges = vec![cx.bounds.loc_range(axis)];
    }
    ranges.retain(|(lo, hi)| hi > lo);
    if !ranges.is_empty() {
        cx.message(Diagnostic::BoundingBoxFallback { axis });
    }
    ranges
}
