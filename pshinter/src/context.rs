//! Per glyph working state and the pass that hints one outline.
//!
//! Every segment, link and value created while hinting a glyph lives in
//! the arenas of a [`GlyphContext`] and is referred to by index. A
//! context is built fresh for every attempt so retries start from clean
//! state.

use super::{
    config::{GlyphFlags, HintConfig},
    conflict, counter,
    error::{PassError, RetryReason},
    eval,
    fixed::Fixed,
    flatten::Flattener,
    geometry::{Axis, Rect},
    hints::{self, GlyphHints},
    merge,
    path::{ElementId, GlyphPath},
    passes, pick, prune,
    report::{Diagnostic, Fixup, Reporter},
    segments::{self, LinkId, SegmentId, SegmentLink, SegmentLists, SegmentKind, Side, StemSegment},
    values::{self, StemValue, ValueId},
};

/// Working state for hinting one glyph.
pub(crate) struct GlyphContext<'a> {
    pub config: &'a HintConfig,
    pub flags: GlyphFlags,
    pub reporter: &'a mut dyn Reporter,
    pub path: GlyphPath,
    pub flattener: Flattener,
    /// Outline is predominantly counter-clockwise.
    pub ccw: bool,
    pub bounds: Rect,
    pub segments: Vec<StemSegment>,
    pub links: Vec<SegmentLink>,
    /// Live segments per axis.
    pub lists: [SegmentLists; 2],
    pub values: Vec<StemValue>,
    /// Unmerged, unpruned values per axis, input to the picker.
    pub candidates: [Vec<ValueId>; 2],
    /// Picked values per axis, sorted by low edge.
    pub coloring: [Vec<ValueId>; 2],
    /// Axes whose coloring is a counter group.
    pub counter: [bool; 2],
    pub fixups: Vec<Fixup>,
    /// Curves split so far to resolve conflicts.
    pub splits: usize,
}

impl<'a> GlyphContext<'a> {
    pub fn new(
        path: GlyphPath,
        config: &'a HintConfig,
        flags: GlyphFlags,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        let flattener =
            Flattener::new(config.flatten_tolerance).with_max_depth(config.flatten_depth);
        let ccw = path.signed_area() > 0;
        let bounds = path.bounds(&flattener).unwrap_or_default();
        Self {
            config,
            flags,
            reporter,
            path,
            flattener,
            ccw,
            bounds,
            segments: vec![],
            links: vec![],
            lists: Default::default(),
            values: vec![],
            candidates: Default::default(),
            coloring: Default::default(),
            counter: [false; 2],
            fixups: vec![],
            splits: 0,
        }
    }

    /// Runs every stage over the glyph.
    pub fn run(mut self) -> Result<GlyphHints, PassError> {
        self.mark_duplicates();
        for axis in Axis::ALL {
            segments::generate_segments(&mut self, axis)?;
            eval::evaluate(&mut self, axis);
            prune::prune_values(&mut self, axis);
            merge::merge_values(&mut self, axis);
            merge::assign_best(&mut self, axis);
        }
        for axis in Axis::ALL {
            pick::pick_values(&mut self, axis);
        }
        eval::report_near_misses(&mut self);
        if self.flags.fix_near_misses && self.flags.allow_edits && !self.fixups.is_empty() {
            let fixups = core::mem::take(&mut self.fixups);
            return Err(PassError::Retry(RetryReason::NearMisses(fixups)));
        }
        for axis in Axis::ALL {
            if self.flags.counter(axis) {
                counter::use_counter(&mut self, axis)?;
            }
        }
        passes::rem_short_colors(&mut self);
        let limit = self.config.max_pass_iterations;
        let mut settled = false;
        for _ in 0..limit {
            let mut changed = conflict::check_element_segments(&mut self);
            for axis in Axis::ALL {
                changed |= passes::rem_flares(&mut self, axis);
            }
            if !changed {
                settled = true;
                break;
            }
        }
        if !settled {
            self.message(Diagnostic::PassLimit { iterations: limit });
            conflict::clear_conflicts(&mut self);
        }
        passes::promote_colors(&mut self);
        log::debug!(
            "picked {} horizontal and {} vertical values after {} splits",
            self.coloring[0].len(),
            self.coloring[1].len(),
            self.splits
        );
        Ok(hints::emit(self))
    }

    /// Flags subpaths that repeat an earlier subpath point for point.
    fn mark_duplicates(&mut self) {
        let subpaths = self.path.subpaths();
        let points = subpaths
            .iter()
            .map(|subpath| self.path.subpath_points(*subpath))
            .collect::<Vec<_>>();
        for (index, subpath) in subpaths.iter().enumerate() {
            if points[..index].contains(&points[index]) {
                self.path.mark_duplicate(*subpath);
                self.message(Diagnostic::DuplicateSubpath { index });
            }
        }
    }

    pub fn message(&mut self, diagnostic: Diagnostic) {
        self.reporter.message(&diagnostic);
    }

    pub fn segment(&self, id: SegmentId) -> &StemSegment {
        &self.segments[id.to_usize()]
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> &mut StemSegment {
        &mut self.segments[id.to_usize()]
    }

    pub fn value(&self, id: ValueId) -> &StemValue {
        &self.values[id.to_usize()]
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut StemValue {
        &mut self.values[id.to_usize()]
    }

    /// Adds a segment. Ghost segments are kept out of the side lists.
    pub fn add_segment(&mut self, segment: StemSegment) -> SegmentId {
        let id = SegmentId::new(self.segments.len());
        if segment.kind != SegmentKind::Ghost {
            self.lists[segment.axis.index()]
                .side_mut(segment.side)
                .push(id);
        }
        self.segments.push(segment);
        id
    }

    pub fn add_value(&mut self, value: StemValue) -> ValueId {
        let id = ValueId::new(self.values.len());
        self.values.push(value);
        id
    }

    /// Attaches a segment to an element. Attaching the same segment twice
    /// returns the existing link.
    pub fn link(&mut self, axis: Axis, element: ElementId, segment: SegmentId) -> LinkId {
        if let Some(existing) = self
            .path
            .get(element)
            .links(axis)
            .iter()
            .find(|link| self.links[link.to_usize()].segment == segment)
        {
            return *existing;
        }
        let id = LinkId::new(self.links.len());
        self.links.push(SegmentLink { segment, element });
        self.path.get_mut(element).links[axis.index()].push(id);
        id
    }

    /// Detaches a link from its element.
    pub fn unlink(&mut self, axis: Axis, link: LinkId) {
        let element = self.links[link.to_usize()].element;
        self.path.get_mut(element).links[axis.index()].retain(|l| *l != link);
    }

    pub fn link_segment(&self, link: LinkId) -> SegmentId {
        self.links[link.to_usize()].segment
    }

    /// Returns the links of an element as an owned list.
    pub fn element_links(&self, axis: Axis, element: ElementId) -> Vec<LinkId> {
        self.path.get(element).links(axis).to_vec()
    }

    /// Returns the representative of the best value of the linked segment.
    pub fn link_value(&self, link: LinkId) -> Option<ValueId> {
        let best = self.segment(self.link_segment(link)).best?;
        Some(self.representative(best))
    }

    /// Returns the value an element wants hinted through a link.
    ///
    /// Picked values always qualify. Any other value must be the best
    /// value of both of its edges and either carry priority or pass the
    /// weight floor of the picker.
    pub fn hint_value(&self, axis: Axis, link: LinkId) -> Option<ValueId> {
        let id = self.link_value(link)?;
        if self.coloring[axis.index()].contains(&id) {
            return Some(id);
        }
        let value = self.value(id);
        let mutual = [value.seg_lo, value.seg_hi].into_iter().all(|seg| {
            self.segment(seg)
                .best
                .is_some_and(|best| self.representative(best) == id)
        });
        let strong = value.priority > 0 || value.weight >= self.config.weight_floor;
        (mutual && strong && !value.pruned).then_some(id)
    }

    /// Moves a link to another element.
    ///
    /// The link is dropped instead if the target already carries the same
    /// segment.
    pub fn move_link(&mut self, axis: Axis, link: LinkId, to: ElementId) {
        let SegmentLink { segment, element } = self.links[link.to_usize()];
        if element == to {
            return;
        }
        self.unlink(axis, link);
        let duplicate = self
            .path
            .get(to)
            .links(axis)
            .iter()
            .any(|l| self.link_segment(*l) == segment);
        if !duplicate {
            self.links[link.to_usize()].element = to;
            self.path.get_mut(to).links[axis.index()].push(link);
        }
        let segment = self.segment_mut(segment);
        if segment.element == Some(element) {
            segment.element = Some(to);
        }
    }

    pub fn representative(&self, id: ValueId) -> ValueId {
        values::representative(&self.values, id)
    }

    /// Span used for overlap tests. Ghost values collapse onto their real
    /// edge.
    pub fn value_span(&self, id: ValueId) -> (Fixed, Fixed) {
        let value = self.value(id);
        if value.ghost {
            let real = if self.segment(value.seg_lo).kind == SegmentKind::Ghost {
                value.hi
            } else {
                value.lo
            };
            return (real, real);
        }
        (value.lo, value.hi)
    }

    /// Returns true if a segment lies in an alignment zone facing the same
    /// way.
    pub fn in_zone(&self, segment: &StemSegment) -> bool {
        if segment.axis != Axis::Horizontal || self.flags.no_blues {
            return false;
        }
        match segment.side {
            Side::Low => self.config.bottom_zone(segment.loc).is_some(),
            Side::High => self.config.top_zone(segment.loc).is_some(),
        }
    }

    /// Moves every attachment of `from` to `to` and retires `from`.
    pub fn replace_segment(&mut self, from: SegmentId, to: SegmentId) {
        let axis = self.segment(from).axis;
        for index in 0..self.links.len() {
            let link = LinkId::new(index);
            let SegmentLink { segment, element } = self.links[index];
            if segment != from || !self.path.get(element).links(axis).contains(&link) {
                continue;
            }
            let duplicate = self
                .path
                .get(element)
                .links(axis)
                .iter()
                .any(|l| self.links[l.to_usize()].segment == to);
            if duplicate {
                self.unlink(axis, link);
            } else {
                self.links[index].segment = to;
            }
        }
        self.retire_segment(from);
    }

    /// Detaches a segment from every element and retires it.
    pub fn remove_segment(&mut self, id: SegmentId) {
        let axis = self.segment(id).axis;
        for index in 0..self.links.len() {
            if self.links[index].segment == id {
                self.unlink(axis, LinkId::new(index));
            }
        }
        self.retire_segment(id);
    }

    fn retire_segment(&mut self, id: SegmentId) {
        let segment = self.segment_mut(id);
        segment.removed = true;
        let (axis, side) = (segment.axis, segment.side);
        self.lists[axis.index()].side_mut(side).retain(|s| *s != id);
    }
}
