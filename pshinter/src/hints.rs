//! Final hints of a glyph and their substitution groups.

use super::{
    context::GlyphContext,
    fixed::Fixed,
    geometry::Axis,
    path::{ElementId, GlyphPath},
    pick::bbox_fallback,
    segments::SegmentKind,
    values::{spans_overlap, ValueId},
};

/// Width marking a ghost hint at the top of a feature.
pub const TOP_GHOST_WIDTH: i32 = -20;

/// Width marking a ghost hint at the bottom of a feature.
pub const BOTTOM_GHOST_WIDTH: i32 = -21;

/// Type of an emitted hint.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HintKind {
    HStem,
    VStem,
    HCounter,
    VCounter,
}

impl HintKind {
    fn new(axis: Axis, counter: bool) -> Self {
        match (axis, counter) {
            (Axis::Horizontal, false) => Self::HStem,
            (Axis::Vertical, false) => Self::VStem,
            (Axis::Horizontal, true) => Self::HCounter,
            (Axis::Vertical, true) => Self::VCounter,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::HStem | Self::HCounter => Axis::Horizontal,
            Self::VStem | Self::VCounter => Axis::Vertical,
        }
    }

    pub fn is_counter(self) -> bool {
        matches!(self, Self::HCounter | Self::VCounter)
    }

    /// Single letter used for the hint in text outline formats.
    pub fn tag(self) -> char {
        match self {
            Self::HStem => 'b',
            Self::VStem => 'y',
            Self::HCounter => 'v',
            Self::VCounter => 'm',
        }
    }
}

/// A hinted stem.
///
/// For ghost hints `high - low` is [`TOP_GHOST_WIDTH`] or
/// [`BOTTOM_GHOST_WIDTH`] and the real edge is `high` or `low`
/// respectively.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HintPoint {
    pub kind: HintKind,
    pub low: Fixed,
    pub high: Fixed,
    /// Outline positions of the elements along the low and high edges.
    pub anchors: [Option<usize>; 2],
    pub ghost: bool,
}

impl HintPoint {
    pub fn width(&self) -> Fixed {
        self.high - self.low
    }

    /// Location of the real edge of a ghost hint.
    pub fn ghost_edge(&self) -> Option<Fixed> {
        if !self.ghost {
            None
        } else if self.width() == Fixed::from_i32(TOP_GHOST_WIDTH) {
            Some(self.high)
        } else {
            Some(self.low)
        }
    }

    fn flip_y(&mut self) {
        if self.kind.axis() != Axis::Horizontal {
            return;
        }
        match self.ghost_edge() {
            Some(edge) => {
                let width = self.width();
                let edge = -edge;
                (self.low, self.high) = if width == Fixed::from_i32(TOP_GHOST_WIDTH) {
                    (edge - width, edge)
                } else {
                    (edge, edge + width)
                };
            }
            None => {
                (self.low, self.high) = (-self.high, -self.low);
                self.anchors.swap(0, 1);
            }
        }
    }
}

/// Hints active from an element onward.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HintGroup {
    /// Outline position of the first element controlled by the group.
    pub start: usize,
    /// Indices into [`GlyphHints::stems`], in increasing order.
    pub hints: Vec<usize>,
}

/// Hints of one glyph.
///
/// Only the stems and groups are serializable; the outline is an in memory
/// arena.
#[derive(Clone, PartialEq, Debug)]
pub struct GlyphHints {
    /// Every hint used by any group, horizontal first, then ordered by low
    /// edge.
    pub stems: Vec<HintPoint>,
    /// Substitution groups in outline order. The first starts at 0.
    pub groups: Vec<HintGroup>,
    /// Outline the hints refer to. Curves may have been split.
    pub path: GlyphPath,
}

impl GlyphHints {
    /// Returns the hints of one axis.
    pub fn axis_stems(&self, axis: Axis) -> impl Iterator<Item = &HintPoint> + '_ {
        self.stems.iter().filter(move |hint| hint.kind.axis() == axis)
    }

    /// Returns the hints active at an outline position.
    pub fn active(&self, position: usize) -> impl Iterator<Item = &HintPoint> + '_ {
        let group = self
            .groups
            .iter()
            .take_while(|group| group.start <= position)
            .last();
        group
            .into_iter()
            .flat_map(|group| group.hints.iter().map(|index| &self.stems[*index]))
    }

    /// Returns true if substitution is needed.
    pub fn has_substitution(&self) -> bool {
        self.groups.len() > 1
    }

    /// Converts hints and outline back to a y down coordinate system.
    pub(crate) fn flip_y(&mut self) {
        for stem in &mut self.stems {
            stem.flip_y();
        }
        self.path.flip_y();
        self.sort();
    }

    /// Orders the stems and remaps the group indices.
    fn sort(&mut self) {
        let mut order = (0..self.stems.len()).collect::<Vec<_>>();
        order.sort_by_key(|index| {
            let stem = &self.stems[*index];
            (stem.kind.axis().index(), stem.low, stem.high)
        });
        let mut remap = vec![0; order.len()];
        for (new, old) in order.iter().enumerate() {
            remap[*old] = new;
        }
        self.stems = order.iter().map(|index| self.stems[*index]).collect();
        for group in &mut self.groups {
            for hint in &mut group.hints {
                *hint = remap[*hint];
            }
            group.hints.sort_unstable();
        }
    }
}

/// Collects stems and groups in emission order.
struct Emitter {
    stems: Vec<HintPoint>,
    values: Vec<Option<ValueId>>,
    groups: Vec<HintGroup>,
}

impl Emitter {
    fn stem(&mut self, cx: &GlyphContext, positions: &[usize], id: ValueId) -> usize {
        if let Some(index) = self.values.iter().position(|v| *v == Some(id)) {
            return index;
        }
        let value = cx.value(id);
        let anchor = |seg| {
            cx.segment(seg)
                .element
                .map(|element| positions[element.to_usize()])
        };
        let (mut low, mut high) = (value.lo, value.hi);
        if value.ghost {
            if cx.segment(value.seg_lo).kind == SegmentKind::Ghost {
                low = high - Fixed::from_i32(TOP_GHOST_WIDTH);
            } else {
                high = low + Fixed::from_i32(BOTTOM_GHOST_WIDTH);
            }
        }
        self.stems.push(HintPoint {
            kind: HintKind::new(value.axis, cx.counter[value.axis.index()]),
            low,
            high,
            anchors: [anchor(value.seg_lo), anchor(value.seg_hi)],
            ghost: value.ghost,
        });
        self.values.push(Some(id));
        self.stems.len() - 1
    }
}

/// Builds the hints of a glyph from its final coloring and the values its
/// elements want hinted.
pub(crate) fn emit(mut cx: GlyphContext) -> GlyphHints {
    let order = cx.path.ids();
    let mut positions = vec![0; cx.path.len()];
    for (position, id) in order.iter().enumerate() {
        positions[id.to_usize()] = position;
    }
    let mut emitter = Emitter {
        stems: vec![],
        values: vec![],
        groups: vec![],
    };
    let margin = cx.config.hint_margin;
    let mut current: Vec<ValueId> = vec![];
    let mut initial = vec![];
    for axis in Axis::ALL {
        let coloring = cx.coloring[axis.index()].clone();
        let wanted_somewhere = order
            .iter()
            .any(|id| !wanted(&cx, axis, *id).is_empty());
        if coloring.is_empty() && !wanted_somewhere {
            for (low, high) in bbox_fallback(&mut cx, axis) {
                emitter.stems.push(HintPoint {
                    kind: HintKind::new(axis, false),
                    low,
                    high,
                    anchors: [None, None],
                    ghost: false,
                });
                emitter.values.push(None);
                initial.push(emitter.stems.len() - 1);
            }
        }
        for id in coloring {
            initial.push(emitter.stem(&cx, &positions, id));
            current.push(id);
        }
    }
    emitter.groups.push(HintGroup {
        start: 0,
        hints: initial.clone(),
    });
    let fixed_hints = initial
        .iter()
        .copied()
        .filter(|index| emitter.values[*index].is_none())
        .collect::<Vec<_>>();
    // Whether the last group already controls an element.
    let mut used = false;
    for (position, id) in order.iter().enumerate() {
        let element_values = Axis::ALL
            .into_iter()
            .flat_map(|axis| wanted(&cx, axis, *id))
            .collect::<Vec<_>>();
        if element_values.is_empty() {
            continue;
        }
        let conflicts = |a: ValueId, b: ValueId| {
            a != b
                && cx.value(a).axis == cx.value(b).axis
                && spans_overlap(cx.value_span(a), cx.value_span(b), margin)
        };
        let clash = element_values
            .iter()
            .any(|v| current.iter().any(|c| conflicts(*v, *c)));
        if clash {
            let mut next = element_values.clone();
            for c in &current {
                if !element_values.iter().any(|v| conflicts(*v, *c)) && !next.contains(c) {
                    next.push(*c);
                }
            }
            current = next;
            let mut hints = fixed_hints.clone();
            hints.extend(current.iter().map(|v| emitter.stem(&cx, &positions, *v)));
            match emitter.groups.last_mut() {
                Some(group) if !used => group.hints = hints,
                _ => emitter.groups.push(HintGroup {
                    start: position,
                    hints,
                }),
            }
        } else {
            for v in element_values {
                if !current.contains(&v) {
                    current.push(v);
                    let index = emitter.stem(&cx, &positions, v);
                    if let Some(group) = emitter.groups.last_mut() {
                        group.hints.push(index);
                    }
                }
            }
        }
        used = true;
    }
    log::debug!(
        "emitted {} stems in {} groups",
        emitter.stems.len(),
        emitter.groups.len()
    );
    let mut path = core::mem::take(&mut cx.path);
    path.clear_links();
    let mut hints = GlyphHints {
        stems: emitter.stems,
        groups: emitter.groups,
        path,
    };
    hints.sort();
    hints
}

/// Distinct values wanted by the links of an element on one axis.
fn wanted(cx: &GlyphContext, axis: Axis, element: ElementId) -> Vec<ValueId> {
    if cx.path.get(element).is_duplicate() {
        return vec![];
    }
    let mut values = vec![];
    for link in cx.path.get(element).links(axis) {
        if let Some(value) = cx.hint_value(axis, *link) {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    values
}
