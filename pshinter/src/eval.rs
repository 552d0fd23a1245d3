//! Scoring of stem candidates.
//!
//! Every low segment is paired with every high segment above it. The
//! weight of a pair grows with the lengths of both edges and falls off
//! with the fourth power of their separation, so long parallel edges
//! that are close together make the strongest stems.

use super::{
    context::GlyphContext,
    fixed::Fixed,
    geometry::Axis,
    report::{Diagnostic, Fixup, StemReport},
    segments::{SegmentId, SegmentKind, Side, StemSegment},
    values::{StemValue, ValueId},
};

/// Scores all segment pairs of one axis and synthesizes ghost values for
/// segments in alignment zones.
pub(crate) fn evaluate(cx: &mut GlyphContext, axis: Axis) {
    let lists = cx.lists[axis.index()].clone();
    let (along_min, along_max) = cx.bounds.along_range(axis);
    let extent = along_max - along_min;
    for &lo in &lists.low {
        for &hi in &lists.high {
            let (low, high) = (cx.segment(lo), cx.segment(hi));
            if high.loc <= low.loc {
                continue;
            }
            let Some(value) = measure(cx, axis, (lo, low), (hi, high), extent) else {
                continue;
            };
            cx.reporter.report_stem(&StemReport {
                axis,
                low: value.lo,
                high: value.hi,
                weight: value.weight,
            });
            let id = cx.add_value(value);
            cx.candidates[axis.index()].push(id);
        }
    }
    combine_values(cx, axis);
    add_ghosts(cx, axis);
    log::trace!(
        "{axis}: {} candidate values",
        cx.candidates[axis.index()].len()
    );
}

fn measure(
    cx: &GlyphContext,
    axis: Axis,
    (lo, low): (SegmentId, &StemSegment),
    (hi, high): (SegmentId, &StemSegment),
    extent: Fixed,
) -> Option<StemValue> {
    let config = cx.config;
    let dist = high.loc - low.loc;
    if dist < config.min_stem_width {
        return None;
    }
    if low.kind == SegmentKind::Bend && high.kind == SegmentKind::Bend {
        return None;
    }
    let in_band = cx.in_zone(low) || cx.in_zone(high);
    let len_lo = low.len().max(Fixed::ONE).to_f64();
    let len_hi = high.len().max(Fixed::ONE).to_f64();
    let overlap = low.max.min(high.max) - low.min.max(high.min);
    let d = dist.to_f64();
    let effective = if overlap >= Fixed::ZERO {
        let covered = (overlap.to_f64() / len_lo.min(len_hi)).min(1.0);
        d * (1.0 + 0.4 * (1.0 - covered))
    } else {
        let gap = (-overlap).to_f64();
        // Edges far apart along the axis are unrelated parts of the glyph.
        if !in_band && gap * 2.0 > extent.to_f64() {
            return None;
        }
        d * 7.0 / 5.0 + gap * gap / 40.0
    };
    let ratio = len_lo * len_hi / (effective * effective);
    let mut weight = 1000.0 * ratio * ratio;
    let big = config.big_dist(axis);
    if dist > big {
        weight *= (big.to_f64() / d).powi(8);
    }
    let weight = weight.clamp(config.min_weight, config.max_weight);
    let stems = config.stems(axis);
    let mut priority = 0;
    if in_band {
        priority += config.band_priority;
    }
    if stems.contains(&dist) {
        priority += 1;
    }
    if low.bonus || high.bonus {
        priority += 1;
    }
    let near_miss = if stems.contains(&dist) {
        None
    } else {
        stems
            .iter()
            .copied()
            .filter(|width| (*width - dist).abs() <= config.near_miss_tolerance)
            .min_by_key(|width| (*width - dist).abs())
    };
    Some(StemValue {
        axis,
        lo: low.loc,
        hi: high.loc,
        weight,
        init_weight: weight,
        priority,
        ghost: false,
        seg_lo: lo,
        seg_hi: hi,
        pruned: false,
        merged: false,
        near_miss,
        best: None,
    })
}

/// Gives values measured more than once over the same span the combined
/// weight of all measurements.
///
/// Two equal weights combine to four times either one, so independent
/// corroborating pairs outrank a single stronger pair.
fn combine_values(cx: &mut GlyphContext, axis: Axis) {
    let ids = cx.candidates[axis.index()].clone();
    let mut done = vec![false; ids.len()];
    for i in 0..ids.len() {
        if done[i] {
            continue;
        }
        let span = (cx.value(ids[i]).lo, cx.value(ids[i]).hi);
        let group = (i..ids.len())
            .filter(|j| {
                let value = cx.value(ids[*j]);
                !value.ghost && (value.lo, value.hi) == span
            })
            .collect::<Vec<_>>();
        if group.len() < 2 {
            continue;
        }
        let root = group
            .iter()
            .map(|j| cx.value(ids[*j]).weight.sqrt())
            .sum::<f64>();
        let weight = (root * root).clamp(cx.config.min_weight, cx.config.max_weight);
        for j in group {
            done[j] = true;
            let value = cx.value_mut(ids[j]);
            value.weight = weight;
            value.init_weight = weight;
        }
    }
}

/// Pairs each segment lying in an alignment zone with a synthetic edge
/// just inside the zone.
fn add_ghosts(cx: &mut GlyphContext, axis: Axis) {
    let config = cx.config;
    if axis != Axis::Horizontal
        || cx.flags.no_blues
        || (config.top_zones.is_empty() && config.bottom_zones.is_empty())
    {
        return;
    }
    let lists = cx.lists[axis.index()].clone();
    let width = config.ghost_width;
    for id in lists.low.iter().chain(&lists.high).copied() {
        let segment = cx.segment(id).clone();
        if !cx.in_zone(&segment) {
            continue;
        }
        let (loc, side) = match segment.side {
            Side::Low => (segment.loc + width, Side::High),
            Side::High => (segment.loc - width, Side::Low),
        };
        let ghost = cx.add_segment(StemSegment {
            loc,
            kind: SegmentKind::Ghost,
            side,
            bonus: false,
            element: None,
            best: None,
            removed: false,
            ..segment
        });
        let (seg_lo, seg_hi) = match segment.side {
            Side::Low => (id, ghost),
            Side::High => (ghost, id),
        };
        let value = StemValue {
            axis,
            lo: cx.segment(seg_lo).loc,
            hi: cx.segment(seg_hi).loc,
            weight: config.ghost_weight,
            init_weight: config.ghost_weight,
            priority: config.band_priority,
            ghost: true,
            seg_lo,
            seg_hi,
            pruned: false,
            merged: false,
            near_miss: None,
            best: None,
        };
        let value = cx.add_value(value);
        cx.candidates[axis.index()].push(value);
    }
}

/// Reports stems and zone edges of the picked values that narrowly miss
/// a dominant width or an alignment zone, collecting a fix-up for each.
pub(crate) fn report_near_misses(cx: &mut GlyphContext) {
    for axis in Axis::ALL {
        for id in cx.coloring[axis.index()].clone() {
            let value = cx.value(id).clone();
            if let Some(dominant) = value.near_miss {
                cx.message(Diagnostic::StemNearMiss {
                    axis,
                    width: value.width(),
                    dominant,
                });
                add_fixup(
                    cx,
                    Fixup {
                        axis,
                        from: value.hi,
                        to: value.lo + dominant,
                    },
                );
            }
            if axis == Axis::Horizontal && !cx.flags.no_blues {
                for seg in [value.seg_lo, value.seg_hi] {
                    band_near_miss(cx, seg);
                }
            }
        }
    }
}

fn band_near_miss(cx: &mut GlyphContext, id: SegmentId) {
    let segment = cx.segment(id);
    if segment.kind == SegmentKind::Ghost || cx.in_zone(segment) {
        return;
    }
    let config = cx.config;
    let zones = match segment.side {
        Side::Low => &config.bottom_zones,
        Side::High => &config.top_zones,
    };
    let loc = segment.loc;
    let (margin, tolerance) = (config.band_margin, config.near_miss_tolerance);
    let edge = zones.iter().find_map(|zone| {
        let (bottom, top) = (zone.bottom - margin, zone.top + margin);
        if loc < bottom && bottom - loc <= tolerance {
            Some(bottom)
        } else if loc > top && loc - top <= tolerance {
            Some(top)
        } else {
            None
        }
    });
    if let Some(edge) = edge {
        cx.message(Diagnostic::BandNearMiss { loc, edge });
        add_fixup(
            cx,
            Fixup {
                axis: Axis::Horizontal,
                from: loc,
                to: edge,
            },
        );
    }
}

fn add_fixup(cx: &mut GlyphContext, fixup: Fixup) {
    if cx.fixups.len() < cx.config.max_fixups
        && !cx.fixups.iter().any(|f| f.axis == fixup.axis && f.from == fixup.from)
    {
        cx.fixups.push(fixup);
    }
}

/// Returns the candidate values of an axis that are still live.
pub(crate) fn live_values(cx: &GlyphContext, axis: Axis) -> Vec<ValueId> {
    cx.candidates[axis.index()]
        .iter()
        .copied()
        .filter(|id| {
            let value = cx.value(*id);
            !value.pruned && !value.merged
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BlueZone, GlyphFlags, HintConfig},
        context::tests::{evaluated, spans},
        report::CollectReporter,
    };

    const RECT: &str = "M0 0 L100 0 L100 100 L0 100 Z";

    #[test]
    fn rectangle_pairs() {
        let config = HintConfig::default();
        let mut reporter = CollectReporter::default();
        let cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        for axis in Axis::ALL {
            let ids = &cx.candidates[axis.index()];
            assert_eq!(spans(&cx, ids), [(0.0, 100.0)]);
            let value = cx.value(ids[0]);
            assert_eq!(value.weight, 1000.0);
            assert_eq!(value.priority, 0);
            assert!(!value.ghost);
        }
        drop(cx);
        assert_eq!(reporter.stems.len(), 2);
    }

    #[test]
    fn weight_is_clamped() {
        let config = HintConfig {
            max_weight: 500.0,
            ..Default::default()
        };
        let mut reporter = ();
        let cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        assert_eq!(cx.value(cx.candidates[0][0]).weight, 500.0);
    }

    #[test]
    fn wide_stems_fall_off() {
        let config = HintConfig::default();
        let mut reporter = ();
        let cx = evaluated(
            "M0 0 L300 0 L300 300 L0 300 Z",
            &config,
            GlyphFlags::default(),
            &mut reporter,
        );
        // full overlap gives 1000 before the (150 / 300)^8 falloff
        let weight = cx.value(cx.candidates[0][0]).weight;
        assert!((weight - 1000.0 / 256.0).abs() < 1e-9);
    }

    #[test]
    fn dominant_width_and_zone_priority() {
        let config = HintConfig {
            h_stems: vec![Fixed::from_i32(100)],
            v_stems: vec![Fixed::from_i32(98)],
            bottom_zones: vec![BlueZone::from_units(-10, 0)],
            ..Default::default()
        };
        let mut reporter = ();
        let cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        let real = cx.candidates[0]
            .iter()
            .map(|id| cx.value(*id))
            .find(|v| !v.ghost)
            .unwrap();
        // band plus exact width
        assert_eq!(real.priority, 3);
        let vertical = cx.value(cx.candidates[1][0]);
        assert_eq!(vertical.priority, 0);
        assert_eq!(vertical.near_miss, Some(Fixed::from_i32(98)));
    }

    #[test]
    fn ghosts_only_in_zones() {
        let mut config = HintConfig {
            top_zones: vec![BlueZone::from_units(100, 110)],
            bottom_zones: vec![BlueZone::from_units(-10, 0)],
            ..Default::default()
        };
        let mut reporter = ();
        let cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        let ghosts = cx.candidates[0]
            .iter()
            .filter(|id| cx.value(**id).ghost)
            .copied()
            .collect::<Vec<_>>();
        assert_eq!(spans(&cx, &ghosts), [(0.0, 20.0), (80.0, 100.0)]);
        assert_eq!(cx.value(ghosts[0]).weight, 1000.0);
        assert_eq!(cx.value(ghosts[0]).priority, 2);
        // ghost segments stay out of the side lists
        assert_eq!(cx.lists[0].len(), 2);
        drop(cx);
        config.top_zones.clear();
        config.bottom_zones.clear();
        let mut reporter = ();
        let cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        assert!(cx.values.iter().all(|v| !v.ghost));
        drop(cx);
        config.top_zones = vec![BlueZone::from_units(100, 110)];
        let flags = GlyphFlags {
            no_blues: true,
            ..Default::default()
        };
        let mut reporter = ();
        let cx = evaluated(RECT, &config, flags, &mut reporter);
        assert!(cx.values.iter().all(|v| !v.ghost));
    }

    #[test]
    fn corroborating_pairs_combine() {
        // Two bottom edges at the same height under one top edge
        let config = HintConfig::default();
        let mut reporter = ();
        let cx = evaluated(
            "M0 0 L30 0 L30 70 L70 70 L70 0 L100 0 L100 100 L0 100 Z",
            &config,
            GlyphFlags::default(),
            &mut reporter,
        );
        let tall = cx.candidates[0]
            .iter()
            .map(|id| cx.value(*id))
            .filter(|v| v.lo == Fixed::ZERO && v.hi == Fixed::from_i32(100))
            .collect::<Vec<_>>();
        assert_eq!(tall.len(), 2);
        // each pair alone weighs 90
        for value in tall {
            assert!((value.weight - 360.0).abs() < 1e-6);
            assert_eq!(value.weight, value.init_weight);
        }
    }

    #[test]
    fn distant_edges_are_unrelated() {
        // Two boxes side by side with different heights
        let config = HintConfig::default();
        let mut reporter = ();
        let cx = evaluated(
            "M0 0 L100 0 L100 100 L0 100 Z M500 200 L600 200 L600 300 L500 300 Z",
            &config,
            GlyphFlags::default(),
            &mut reporter,
        );
        assert_eq!(
            spans(&cx, &cx.candidates[0]),
            [(0.0, 100.0), (200.0, 300.0)]
        );
    }

    #[test]
    fn near_misses_produce_fixups() {
        let config = HintConfig {
            h_stems: vec![Fixed::from_i32(101)],
            bottom_zones: vec![BlueZone::from_units(2, 10)],
            ..Default::default()
        };
        let mut reporter = CollectReporter::default();
        let mut cx = evaluated(RECT, &config, GlyphFlags::default(), &mut reporter);
        cx.coloring[0] = cx.candidates[0].clone();
        report_near_misses(&mut cx);
        assert_eq!(
            cx.fixups,
            [
                Fixup {
                    axis: Axis::Horizontal,
                    from: Fixed::from_i32(100),
                    to: Fixed::from_i32(101),
                },
                Fixup {
                    axis: Axis::Horizontal,
                    from: Fixed::ZERO,
                    to: Fixed::from_i32(2),
                },
            ]
        );
        drop(cx);
        assert!(reporter
            .messages
            .iter()
            .any(|m| matches!(m, Diagnostic::BandNearMiss { .. })));
    }
}
