//! Counter hints for glyphs with three evenly spaced stems.

use super::{
    context::GlyphContext,
    error::{PassError, RetryReason},
    eval::live_values,
    fixed::Fixed,
    geometry::Axis,
    pick::claim_edges,
    report::Diagnostic,
    values::spans_overlap,
};

/// Replaces the coloring of an axis with the three heaviest stems if they
/// are spaced symmetrically.
///
/// The third stem must clearly outweigh any fourth. Symmetry is tested
/// on the centers and on the widths of the outer stems, first with the
/// strict and then with the relaxed tolerance. On failure the glyph must
/// be hinted again without counter hints on this axis.
pub(crate) fn use_counter(cx: &mut GlyphContext, axis: Axis) -> Result<(), PassError> {
    let mut ids = live_values(cx, axis)
        .into_iter()
        .filter(|id| !cx.value(*id).ghost)
        .collect::<Vec<_>>();
    ids.sort_by(|a, b| cx.value(*b).weight.total_cmp(&cx.value(*a).weight));
    let qualified = ids.len() >= 3
        && ids
            .get(3)
            .map(|fourth| {
                cx.value(ids[2]).weight >= cx.value(*fourth).weight * cx.config.counter_weight_ratio
            })
            .unwrap_or(true);
    if !qualified {
        return fail(cx, axis);
    }
    let mut stems = ids[..3].to_vec();
    stems.sort_by_key(|id| cx.value(*id).lo);
    let spans = stems
        .iter()
        .map(|id| cx.value_span(*id))
        .collect::<Vec<_>>();
    let overlapping = (0..3).any(|i| {
        (i + 1..3).any(|j| spans_overlap(spans[i], spans[j], cx.config.hint_margin))
    });
    if overlapping {
        return fail(cx, axis);
    }
    let center = |(lo, hi): (Fixed, Fixed)| lo.midpoint(hi);
    let gap_skew = ((center(spans[1]) - center(spans[0])) - (center(spans[2]) - center(spans[1]))).abs();
    let width_skew = ((spans[0].1 - spans[0].0) - (spans[2].1 - spans[2].0)).abs();
    let skew = gap_skew.max(width_skew);
    if skew > cx.config.counter_relaxed_tolerance {
        return fail(cx, axis);
    }
    if skew > cx.config.counter_tolerance {
        cx.message(Diagnostic::RelaxedCounter { axis });
    }
    log::debug!("{axis}: counter hints with skew {skew}");
    claim_edges(cx, axis, &stems);
    cx.coloring[axis.index()] = stems;
    cx.counter[axis.index()] = true;
    Ok(())
}

fn fail(cx: &mut GlyphContext, axis: Axis) -> Result<(), PassError> {
    cx.message(Diagnostic::CounterHintFailed { axis });
    Err(PassError::Retry(RetryReason::CounterHintsFailed(axis)))
}
