//! Merging of near duplicate stem candidates and best value assignment.

use super::{
    context::GlyphContext,
    eval::live_values,
    geometry::Axis,
    prune::close_in_path,
    values::{compare_values, ValueId},
};

/// Folds values with identical or nearly identical spans into a single
/// representative.
///
/// Ghost values take no part; they compete with real values only in the
/// picker.
pub(crate) fn merge_values(cx: &mut GlyphContext, axis: Axis) {
    let ids = live_values(cx, axis)
        .into_iter()
        .filter(|id| !cx.value(*id).ghost)
        .collect::<Vec<_>>();
    // Identical spans keep the strongest member.
    for &id in &ids {
        if cx.value(id).merged {
            continue;
        }
        let span = (cx.value(id).lo, cx.value(id).hi);
        let group = ids
            .iter()
            .copied()
            .filter(|other| {
                let value = cx.value(*other);
                !value.merged && (value.lo, value.hi) == span
            })
            .collect::<Vec<_>>();
        let Some(rep) = group.iter().copied().max_by(|a, b| {
            let (va, vb) = (cx.value(*a), cx.value(*b));
            va.priority
                .cmp(&vb.priority)
                .then(va.weight.total_cmp(&vb.weight))
                .then(b.cmp(a))
        }) else {
            continue;
        };
        for other in group {
            if other != rep {
                let value = cx.value_mut(other);
                value.merged = true;
                value.best = Some(rep);
            }
        }
    }
    // Spans that nearly coincide and are joined along the outline.
    let reps = ids
        .into_iter()
        .filter(|id| !cx.value(*id).merged)
        .collect::<Vec<_>>();
    let mut count = 0;
    for i in 0..reps.len() {
        for j in i + 1..reps.len() {
            let (a, b) = (reps[i], reps[j]);
            if cx.value(a).merged || cx.value(b).merged || !nearly_coincide(cx, a, b) {
                continue;
            }
            let (winner, loser) = if ranks_above(cx, a, b) { (a, b) } else { (b, a) };
            let won = cx.value(winner).clone();
            let value = cx.value_mut(loser);
            value.lo = won.lo;
            value.hi = won.hi;
            value.weight = won.weight;
            value.priority = won.priority;
            value.merged = true;
            value.best = Some(winner);
            count += 1;
        }
    }
    log::debug!("{axis}: merged {count} near duplicate values");
}

fn nearly_coincide(cx: &mut GlyphContext, a: ValueId, b: ValueId) -> bool {
    let (va, vb) = (cx.value(a).clone(), cx.value(b).clone());
    let config = cx.config;
    let d_lo = (va.lo - vb.lo).abs();
    let d_hi = (va.hi - vb.hi).abs();
    if va.lo == vb.lo && d_hi <= config.merge_distance {
        return close_in_path(cx, va.seg_hi, vb.seg_hi);
    }
    if va.hi == vb.hi && d_lo <= config.merge_distance {
        return close_in_path(cx, va.seg_lo, vb.seg_lo);
    }
    d_lo <= config.bend_merge_tolerance
        && d_hi <= config.bend_merge_tolerance
        && close_in_path(cx, va.seg_lo, vb.seg_lo)
        && close_in_path(cx, va.seg_hi, vb.seg_hi)
}

/// Values whose edges sit in alignment zones win; otherwise priority and
/// then weight decide.
fn ranks_above(cx: &GlyphContext, a: ValueId, b: ValueId) -> bool {
    let zoned = |id: ValueId| {
        let value = cx.value(id);
        [value.seg_lo, value.seg_hi]
            .into_iter()
            .filter(|seg| cx.in_zone(cx.segment(*seg)))
            .count()
    };
    let (va, vb) = (cx.value(a), cx.value(b));
    zoned(a)
        .cmp(&zoned(b))
        .then(va.priority.cmp(&vb.priority))
        .then(va.weight.total_cmp(&vb.weight))
        .then(b.cmp(&a))
        .is_gt()
}

/// Records for each segment the best representative value using it and
/// detaches segments left without one.
pub(crate) fn assign_best(cx: &mut GlyphContext, axis: Axis) {
    let factor = cx.config.priority_factor;
    let shift = cx.config.ghost_shift;
    for id in cx.candidates[axis.index()].clone() {
        if cx.value(id).pruned {
            continue;
        }
        let rep = cx.representative(id);
        if cx.value(rep).pruned {
            continue;
        }
        let (seg_lo, seg_hi) = (cx.value(id).seg_lo, cx.value(id).seg_hi);
        for seg in [seg_lo, seg_hi] {
            let better = match cx.segment(seg).best {
                None => true,
                Some(current) => {
                    current != rep && compare_values(cx.value(rep), cx.value(current), factor, shift)
                }
            };
            if better {
                cx.segment_mut(seg).best = Some(rep);
            }
        }
    }
    for element in cx.path.ids() {
        for link in cx.element_links(axis, element) {
            if cx.segment(cx.link_segment(link)).best.is_none() {
                cx.unlink(axis, link);
            }
        }
    }
}
