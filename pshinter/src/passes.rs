//! Clean up passes over the hints attached to path elements.

use super::{
    context::GlyphContext,
    fixed::Fixed,
    geometry::{self, Axis, Point},
    path::ElementId,
    report::Diagnostic,
    segments::LinkId,
    values::ValueId,
};

/// Approximate length of an element. Curves are measured by the extent of
/// their control points.
pub(crate) fn element_length(cx: &GlyphContext, id: ElementId) -> Fixed {
    match cx.path.cubic(id) {
        Some(curve) => {
            let rect = curve.control_bounds();
            geometry::approx_length(Point::new(rect.x_max - rect.x_min, rect.y_max - rect.y_min))
        }
        None => geometry::approx_length(cx.path.end_point(id) - cx.path.start_point(id)),
    }
}

fn first_hinted(cx: &GlyphContext, axis: Axis, element: ElementId) -> Option<(LinkId, ValueId)> {
    cx.path
        .get(element)
        .links(axis)
        .iter()
        .find_map(|link| Some((*link, cx.hint_value(axis, *link)?)))
}

/// Drops the weaker of two hints on consecutive hinted elements of a
/// subpath whose edges sit a few units apart.
///
/// The elements between the two must stay within the flare tolerance of
/// both edges. Hints in alignment zones and very heavy hints are kept.
/// Returns true if a hint was dropped.
pub(crate) fn rem_flares(cx: &mut GlyphContext, axis: Axis) -> bool {
    let tolerance = cx.config.flare_tolerance;
    let mut changed = false;
    for subpath in cx.path.subpaths() {
        let elements = cx.path.subpath_elements(subpath);
        let mut prev: Option<(usize, LinkId, ValueId)> = None;
        for (index, &element) in elements.iter().enumerate() {
            let Some((link, value)) = first_hinted(cx, axis, element) else {
                continue;
            };
            let Some((prev_index, prev_link, prev_value)) = prev else {
                prev = Some((index, link, value));
                continue;
            };
            let loc = cx.segment(cx.link_segment(link)).loc;
            let prev_loc = cx.segment(cx.link_segment(prev_link)).loc;
            let diff = (loc - prev_loc).abs();
            let between_close = elements[prev_index + 1..index].iter().all(|id| {
                let end = cx.path.end_point(*id).loc(axis);
                (end - loc).abs() <= tolerance && (end - prev_loc).abs() <= tolerance
            });
            if prev_value == value || diff == Fixed::ZERO || diff > tolerance || !between_close {
                prev = Some((index, link, value));
                continue;
            }
            let current_weaker = cx.value(value).weight < cx.value(prev_value).weight;
            let (weak_link, weak_value) = if current_weaker {
                (link, value)
            } else {
                (prev_link, prev_value)
            };
            let segment = cx.segment(cx.link_segment(weak_link));
            if cx.in_zone(segment) || cx.value(weak_value).weight >= cx.config.flare_keep_weight {
                prev = Some((index, link, value));
                continue;
            }
            let flare = Diagnostic::FlareRemoved {
                axis,
                loc: segment.loc,
                kept: if current_weaker { prev_loc } else { loc },
            };
            cx.message(flare);
            cx.unlink(axis, weak_link);
            changed = true;
            if !current_weaker {
                prev = Some((index, link, value));
            }
        }
    }
    changed
}

/// Strips the links of elements too short to carry hints of their own.
pub(crate) fn rem_short_colors(cx: &mut GlyphContext) {
    let limit = cx.config.min_element_length;
    let mut count = 0;
    for element in cx.path.ids() {
        if !cx.path.get(element).is_drawing() || element_length(cx, element) >= limit {
            continue;
        }
        for axis in Axis::ALL {
            for link in cx.element_links(axis, element) {
                cx.unlink(axis, link);
                count += 1;
            }
        }
    }
    if count > 0 {
        log::debug!("removed {count} links from short elements");
    }
}

/// Copies hints onto unhinted tiny elements next to a hinted element so
/// the hint set does not change over a few units of outline.
pub(crate) fn promote_colors(cx: &mut GlyphContext) {
    let distance = cx.config.promote_distance;
    let limit = cx.path.len();
    for axis in Axis::ALL {
        let mut promotions = vec![];
        for element in cx.path.ids() {
            if cx.path.get(element).is_duplicate() {
                continue;
            }
            let Some((link, _)) = first_hinted(cx, axis, element) else {
                continue;
            };
            let segment = cx.link_segment(link);
            for forward in [true, false] {
                let mut cur = element;
                let mut travelled = Fixed::ZERO;
                for _ in 0..limit {
                    cur = if forward {
                        cx.path.next_drawn(cur)
                    } else {
                        cx.path.prev_drawn(cur)
                    };
                    if cur == element || first_hinted(cx, axis, cur).is_some() {
                        break;
                    }
                    travelled += element_length(cx, cur);
                    if travelled > distance {
                        break;
                    }
                    promotions.push((cur, segment));
                }
            }
        }
        for (element, segment) in promotions {
            if first_hinted(cx, axis, element).is_none() {
                cx.link(axis, element, segment);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GlyphFlags, HintConfig},
        context::tests::{attach, evaluated, picked},
        report::CollectReporter,
        segments::Side,
    };

    const FLARE: &str = "M0 0 L100 0 L100 108 L50 108 L50 100 L0 100 Z";
    const CHAMFER: &str = "M0 0 L100 0 L100 100 L2 100 L0 98 Z";

    fn flare_context<'a>(config: &'a HintConfig, reporter: &'a mut ()) -> GlyphContext<'a> {
        let mut cx = evaluated(FLARE, config, GlyphFlags::default(), reporter);
        cx.path.clear_links();
        cx
    }

    #[test]
    fn weaker_flare_is_removed() {
        let config = HintConfig::default();
        let mut reporter = CollectReporter::default();
        let mut cx = evaluated(FLARE, &config, GlyphFlags::default(), &mut reporter);
        cx.path.clear_links();
        let ids = cx.path.ids();
        let (upper, lower) = (ids[3], ids[5]);
        attach(&mut cx, upper, Side::High, (0, 108), 180.0);
        let keep = attach(&mut cx, lower, Side::High, (0, 100), 250.0);
        assert!(rem_flares(&mut cx, Axis::Horizontal));
        assert!(cx.element_links(Axis::Horizontal, upper).is_empty());
        assert_eq!(cx.element_links(Axis::Horizontal, lower), [keep]);
        assert!(!rem_flares(&mut cx, Axis::Horizontal));
        drop(cx);
        assert_eq!(
            reporter.messages,
            [Diagnostic::FlareRemoved {
                axis: Axis::Horizontal,
                loc: Fixed::from_i32(108),
                kept: Fixed::from_i32(100),
            }]
        );
    }

    #[test]
    fn heavy_flare_is_kept() {
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = flare_context(&config, &mut reporter);
        let ids = cx.path.ids();
        attach(&mut cx, ids[3], Side::High, (0, 108), 1500.0);
        attach(&mut cx, ids[5], Side::High, (0, 100), 2500.0);
        assert!(!rem_flares(&mut cx, Axis::Horizontal));
    }

    #[test]
    fn distant_edges_are_not_flares() {
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = flare_context(&config, &mut reporter);
        let ids = cx.path.ids();
        attach(&mut cx, ids[1], Side::Low, (0, 100), 180.0);
        attach(&mut cx, ids[5], Side::High, (0, 100), 250.0);
        attach(&mut cx, ids[3], Side::High, (80, 108), 50.0);
        // 100 and 108 are close but the first and last edges are not
        assert!(rem_flares(&mut cx, Axis::Horizontal));
        assert_eq!(cx.element_links(Axis::Horizontal, ids[1]).len(), 1);
        assert!(cx.element_links(Axis::Horizontal, ids[3]).is_empty());
    }

    #[test]
    fn short_elements_lose_links() {
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = evaluated(CHAMFER, &config, GlyphFlags::default(), &mut reporter);
        let ids = cx.path.ids();
        let chamfer = ids[4];
        assert_eq!(element_length(&cx, chamfer), Fixed::from_f64(2.75));
        attach(&mut cx, chamfer, Side::High, (0, 100), 100.0);
        rem_short_colors(&mut cx);
        assert!(cx.element_links(Axis::Horizontal, chamfer).is_empty());
        assert!(!cx.element_links(Axis::Horizontal, ids[3]).is_empty());
    }

    #[test]
    fn tiny_neighbors_inherit_hints() {
        let config = HintConfig::default();
        let mut reporter = ();
        let mut cx = picked(CHAMFER, &config, GlyphFlags::default(), &mut reporter);
        let ids = cx.path.ids();
        let (top, chamfer, left) = (ids[3], ids[4], ids[5]);
        assert!(cx.element_links(Axis::Horizontal, chamfer).is_empty());
        promote_colors(&mut cx);
        for (axis, from) in [(Axis::Horizontal, top), (Axis::Vertical, left)] {
            let (_, value) = first_hinted(&cx, axis, from).unwrap();
            let (_, promoted) = first_hinted(&cx, axis, chamfer).unwrap();
            assert_eq!(promoted, value);
        }
        // the long right side is out of reach
        assert!(cx.element_links(Axis::Horizontal, ids[2]).is_empty());
    }
}
