//! Glyph outline stored as a linked list of path elements.
//!
//! Elements live in a contiguous arena and refer to each other by index.
//! They are never removed; splitting a curve appends a new element and
//! relinks its neighbors.

use super::{
    flatten::{Cubic, Flattener},
    geometry::{self, Axis, Point, Rect},
    report::Fixup,
    segments::LinkId,
};

/// Index of an element in a [`GlyphPath`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ElementId(u32);

impl ElementId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Type of a path element.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementKind {
    MoveTo,
    LineTo,
    CurveTo,
    /// Closes the subpath with a line back to its start point.
    ClosePath,
}

/// Element is the first curve of a flex pair.
const FLEX_START: u8 = 1 << 0;
/// Element is the second curve of a flex pair.
const FLEX_END: u8 = 1 << 1;
/// Element belongs to a subpath that repeats an earlier one.
const DUPLICATE: u8 = 1 << 2;

/// Single element of a glyph outline.
#[derive(Clone, PartialEq, Debug)]
pub struct PathElement {
    kind: ElementKind,
    /// Control points followed by the end point. Elements other than
    /// curves only use the last entry. The end point of a close is the
    /// start of its subpath.
    points: [Point; 3],
    prev: Option<ElementId>,
    next: Option<ElementId>,
    /// Other half of a split curve.
    pub(crate) conflict: Option<ElementId>,
    /// Attached segment links for horizontal and vertical hints.
    pub(crate) links: [Vec<LinkId>; 2],
    flags: u8,
}

impl PathElement {
    fn new(kind: ElementKind, points: [Point; 3]) -> Self {
        Self {
            kind,
            points,
            prev: None,
            next: None,
            conflict: None,
            links: Default::default(),
            flags: 0,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn end(&self) -> Point {
        self.points[2]
    }

    /// Returns the two control points of a curve.
    pub fn controls(&self) -> Option<(Point, Point)> {
        (self.kind == ElementKind::CurveTo).then_some((self.points[0], self.points[1]))
    }

    pub fn prev(&self) -> Option<ElementId> {
        self.prev
    }

    pub fn next(&self) -> Option<ElementId> {
        self.next
    }

    /// Returns true if the element is either curve of a flex pair.
    pub fn is_flex(&self) -> bool {
        self.flags & (FLEX_START | FLEX_END) != 0
    }

    pub(crate) fn is_flex_start(&self) -> bool {
        self.flags & FLEX_START != 0
    }

    pub(crate) fn is_duplicate(&self) -> bool {
        self.flags & DUPLICATE != 0
    }

    /// Returns true for elements that draw something.
    pub fn is_drawing(&self) -> bool {
        self.kind != ElementKind::MoveTo
    }

    /// Returns the links attached for hints on `axis`.
    pub(crate) fn links(&self, axis: Axis) -> &[LinkId] {
        &self.links[axis.index()]
    }

    fn points_mut(&mut self) -> &mut [Point] {
        match self.kind {
            ElementKind::CurveTo => &mut self.points[..],
            _ => &mut self.points[2..],
        }
    }
}

/// First and last element of a closed subpath.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Subpath {
    pub start: ElementId,
    pub close: ElementId,
}

/// Glyph outline.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct GlyphPath {
    elements: Vec<PathElement>,
    head: Option<ElementId>,
    tail: Option<ElementId>,
}

impl GlyphPath {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<ElementId> {
        self.head
    }

    pub fn get(&self, id: ElementId) -> &PathElement {
        &self.elements[id.to_usize()]
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> &mut PathElement {
        &mut self.elements[id.to_usize()]
    }

    /// Returns an iterator over the elements in outline order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &PathElement)> + '_ {
        let mut cur = self.head;
        // outline order may differ from arena order after splits
        (0..self.elements.len()).map_while(move |_| {
            let id = cur?;
            let element = self.get(id);
            cur = element.next;
            Some((id, element))
        })
    }

    /// Returns the element ids in outline order.
    pub fn ids(&self) -> Vec<ElementId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn push(&mut self, kind: ElementKind, points: [Point; 3]) -> ElementId {
        let id = ElementId::new(self.elements.len());
        let mut element = PathElement::new(kind, points);
        element.prev = self.tail;
        self.elements.push(element);
        match self.tail {
            Some(tail) => self.get_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Point where the element starts.
    pub fn start_point(&self, id: ElementId) -> Point {
        let element = self.get(id);
        match element.prev {
            Some(prev) if element.kind != ElementKind::MoveTo => self.get(prev).end(),
            _ => element.end(),
        }
    }

    pub fn end_point(&self, id: ElementId) -> Point {
        self.get(id).end()
    }

    /// Returns the element as a cubic if it is a curve.
    pub fn cubic(&self, id: ElementId) -> Option<Cubic> {
        let (c0, c1) = self.get(id).controls()?;
        Some(Cubic::new(self.start_point(id), c0, c1, self.end_point(id)))
    }

    /// Returns the move that starts the subpath containing `id`.
    pub fn subpath_start(&self, id: ElementId) -> ElementId {
        let mut cur = id;
        for _ in 0..self.elements.len() {
            let element = self.get(cur);
            if element.kind == ElementKind::MoveTo {
                return cur;
            }
            match element.prev {
                Some(prev) => cur = prev,
                None => break,
            }
        }
        self.head.unwrap_or(id)
    }

    /// Returns the close that ends the subpath containing `id`.
    pub fn subpath_close(&self, id: ElementId) -> ElementId {
        let mut cur = id;
        for _ in 0..self.elements.len() {
            let element = self.get(cur);
            if element.kind == ElementKind::ClosePath {
                return cur;
            }
            match element.next {
                Some(next) if self.get(next).kind != ElementKind::MoveTo => cur = next,
                _ => return cur,
            }
        }
        id
    }

    /// Returns the drawing element following `id`, wrapping around the
    /// subpath.
    pub fn next_drawn(&self, id: ElementId) -> ElementId {
        let element = self.get(id);
        if element.kind != ElementKind::ClosePath {
            if let Some(next) = element.next {
                if self.get(next).kind != ElementKind::MoveTo {
                    return next;
                }
            }
        }
        let start = self.subpath_start(id);
        self.get(start).next.unwrap_or(id)
    }

    /// Returns the drawing element preceding `id`, wrapping around the
    /// subpath.
    pub fn prev_drawn(&self, id: ElementId) -> ElementId {
        let element = self.get(id);
        if element.kind != ElementKind::MoveTo {
            if let Some(prev) = element.prev {
                if self.get(prev).kind != ElementKind::MoveTo {
                    return prev;
                }
            }
        }
        self.subpath_close(id)
    }

    /// Returns the closed subpaths in outline order.
    pub fn subpaths(&self) -> Vec<Subpath> {
        let mut subpaths = vec![];
        let mut start = None;
        for (id, element) in self.iter() {
            match element.kind {
                ElementKind::MoveTo => start = Some(id),
                ElementKind::ClosePath => {
                    if let Some(start) = start.take() {
                        subpaths.push(Subpath { start, close: id });
                    }
                }
                _ => {}
            }
        }
        subpaths
    }

    /// Returns the drawing elements of a subpath in order.
    pub fn subpath_elements(&self, subpath: Subpath) -> Vec<ElementId> {
        let mut ids = vec![];
        let mut cur = self.get(subpath.start).next;
        while let Some(id) = cur {
            if ids.len() >= self.elements.len() {
                break;
            }
            ids.push(id);
            if id == subpath.close {
                break;
            }
            cur = self.get(id).next;
        }
        ids
    }

    /// Marks `first` and the curve following it as a flex pair.
    ///
    /// Returns false, leaving the path unchanged, if `first` is not
    /// followed by another curve.
    pub fn mark_flex(&mut self, first: ElementId) -> bool {
        let Some(second) = self.get(first).next else {
            return false;
        };
        if self.get(first).kind != ElementKind::CurveTo
            || self.get(second).kind != ElementKind::CurveTo
        {
            return false;
        }
        self.get_mut(first).flags |= FLEX_START;
        self.get_mut(second).flags |= FLEX_END;
        true
    }

    pub(crate) fn mark_duplicate(&mut self, subpath: Subpath) {
        for id in self.subpath_elements(subpath) {
            self.get_mut(id).flags |= DUPLICATE;
        }
    }

    /// Splits a curve at its midpoint.
    ///
    /// The first half replaces the curve and the second half is inserted
    /// after it. Returns the id of the second half.
    pub(crate) fn split_curve(&mut self, id: ElementId) -> Option<ElementId> {
        let curve = self.cubic(id)?;
        let (first, second) = curve.split();
        let new_id = ElementId::new(self.elements.len());
        let next = self.get(id).next;
        let mut element = PathElement::new(ElementKind::CurveTo, [second.p1, second.p2, second.p3]);
        element.prev = Some(id);
        element.next = next;
        element.conflict = Some(id);
        self.elements.push(element);
        match next {
            Some(next) => self.get_mut(next).prev = Some(new_id),
            None => self.tail = Some(new_id),
        }
        let element = self.get_mut(id);
        element.points = [first.p1, first.p2, first.p3];
        element.next = Some(new_id);
        element.conflict = Some(new_id);
        Some(new_id)
    }

    /// Bounding box of the outline.
    pub fn bounds(&self, flattener: &Flattener) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        for subpath in self.subpaths() {
            let sub = self.subpath_bounds(subpath, flattener);
            match rect.as_mut() {
                Some(rect) => rect.union(&sub),
                None => rect = Some(sub),
            }
        }
        rect
    }

    /// Bounding box of one subpath.
    pub fn subpath_bounds(&self, subpath: Subpath, flattener: &Flattener) -> Rect {
        let mut rect = Rect::from_point(self.end_point(subpath.start));
        for id in self.subpath_elements(subpath) {
            match self.cubic(id) {
                Some(curve) => rect.union(&geometry::curve_bounds(&curve, flattener)),
                None => rect.include(self.end_point(id)),
            }
        }
        rect
    }

    /// Signed area of the control polygon of all subpaths; positive when
    /// the outline is predominantly counter-clockwise.
    pub fn signed_area(&self) -> i64 {
        self.subpaths()
            .into_iter()
            .map(|subpath| {
                let points = self.subpath_elements(subpath).into_iter().flat_map(|id| {
                    let element = self.get(id);
                    let count = element.controls().map(|_| 3).unwrap_or(1);
                    element.points[3 - count..].to_vec()
                });
                geometry::signed_area(points)
            })
            .sum()
    }

    /// Returns the points of a subpath, used to detect repeated subpaths.
    pub(crate) fn subpath_points(&self, subpath: Subpath) -> Vec<(ElementKind, [Point; 3])> {
        self.subpath_elements(subpath)
            .into_iter()
            .map(|id| {
                let element = self.get(id);
                (element.kind, element.points)
            })
            .collect()
    }

    /// Moves every coordinate matching the fix-up. Returns the number of
    /// points moved.
    pub(crate) fn apply_fixup(&mut self, fixup: &Fixup) -> usize {
        let mut count = 0;
        for element in &mut self.elements {
            for point in element.points_mut() {
                if point.loc(fixup.axis) == fixup.from {
                    *point = Point::from_loc(fixup.axis, fixup.to, point.along(fixup.axis));
                    count += 1;
                }
            }
        }
        count
    }

    /// Negates all y coordinates.
    pub(crate) fn flip_y(&mut self) {
        for element in &mut self.elements {
            for point in element.points_mut() {
                *point = point.flip_y();
            }
        }
    }

    /// Removes all segment links.
    pub(crate) fn clear_links(&mut self) {
        for element in &mut self.elements {
            element.links = Default::default();
            element.conflict = None;
        }
    }
}
