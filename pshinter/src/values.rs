//! Scored stem candidates.

use super::{fixed::Fixed, geometry::Axis, segments::SegmentId};

/// Index of a stem value in the per glyph arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Candidate stem between a low and a high segment.
#[derive(Clone, PartialEq, Debug)]
pub struct StemValue {
    pub axis: Axis,
    /// Location of the low edge.
    pub lo: Fixed,
    /// Location of the high edge.
    pub hi: Fixed,
    pub weight: f64,
    /// Weight before merging replaced it.
    pub init_weight: f64,
    pub priority: i32,
    /// One edge is a synthetic zone edge.
    pub ghost: bool,
    pub seg_lo: SegmentId,
    pub seg_hi: SegmentId,
    pub(crate) pruned: bool,
    pub(crate) merged: bool,
    /// Dominant width this stem narrowly misses.
    pub(crate) near_miss: Option<Fixed>,
    /// Representative this value was merged into.
    pub(crate) best: Option<ValueId>,
}

impl StemValue {
    pub fn width(&self) -> Fixed {
        self.hi - self.lo
    }

    /// Weight used when ranking, with ghosts scaled down by `ghost_shift`
    /// halvings.
    fn ranked_weight(&self, ghost_shift: u32) -> f64 {
        if self.ghost {
            self.weight / (1u64 << ghost_shift.min(32)) as f64
        } else {
            self.weight
        }
    }
}

/// Returns true if `a` ranks above `b`.
///
/// Priority dominates unless the lower priority value outweighs the other
/// by more than `factor`. When exactly one of the two is a ghost its weight
/// is reduced by `ghost_shift` halvings first.
pub fn compare_values(a: &StemValue, b: &StemValue, factor: f64, ghost_shift: u32) -> bool {
    let shift = if a.ghost != b.ghost { ghost_shift } else { 0 };
    let (v1, v2) = (a.ranked_weight(shift), b.ranked_weight(shift));
    match a.priority.cmp(&b.priority) {
        core::cmp::Ordering::Equal => v1 > v2,
        core::cmp::Ordering::Greater => v1 * factor > v2,
        core::cmp::Ordering::Less => v1 > v2 * factor,
    }
}

/// Returns true if the closed spans overlap or come within `margin` of
/// each other.
pub fn spans_overlap(a: (Fixed, Fixed), b: (Fixed, Fixed), margin: Fixed) -> bool {
    a.0 <= b.1 + margin && b.0 <= a.1 + margin
}

/// Follows merge pointers from `id` to its representative.
///
/// The chase is bounded by the number of values so a malformed chain can
/// not loop.
pub(crate) fn representative(values: &[StemValue], id: ValueId) -> ValueId {
    let mut cur = id;
    for _ in 0..values.len() {
        match values[cur.to_usize()].best {
            Some(next) if next != cur => cur = next,
            _ => break,
        }
    }
    cur
}
