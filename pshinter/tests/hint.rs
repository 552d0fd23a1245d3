use kurbo::{BezPath, PathEl};
use pretty_assertions::assert_eq;
use pshinter::{
    hint_glyph, hint_glyphs, Axis, BlueZone, CollectReporter, Diagnostic, Glyph, GlyphFlags,
    GlyphHints, GlyphPath, GlyphPathBuilder, HintConfig, HintError, HintKind, OutlinePen,
};

const RECT: &str = "M0 0 L100 0 L100 100 L0 100 Z";
const I_BEAM: &str = "M5 0 L295 0 L295 60 L180 60 L180 640 L300 640 L300 700 L0 700 \
                      L0 640 L120 640 L120 60 L5 60 Z";
const DIAMOND: &str = "M250 0 L500 250 L250 500 L0 250 Z";
const FLARE: &str = "M0 0 L100 0 L100 108 L50 108 L50 100 L0 100 Z";
const STEPPED_BAR: &str = "M0 0 L60 0 L60 6 L100 6 L100 106 L60 106 L60 100 L0 100 Z";
const OVERLAPPING: &str =
    "M0 0 L100 0 L100 100 L0 100 Z M200 50 L300 50 L300 150 L200 150 Z";
const BOWL: &str = "M250 0 C380 0 480 160 480 350 C480 540 380 700 250 700 \
                    C120 700 20 540 20 350 C20 160 120 0 250 0 Z";
const RING: &str = "M250 0 C388 0 500 112 500 250 C500 388 388 500 250 500 \
                    C112 500 0 388 0 250 C0 112 112 0 250 0 Z \
                    M250 80 C156 80 80 156 80 250 C80 344 156 420 250 420 \
                    C344 420 420 344 420 250 C420 156 344 80 250 80 Z";
const BOLD_D: &str = "M0 0 L100 0 C300 0 300 500 100 500 L0 500 Z \
                      M60 60 L60 440 L100 440 C220 440 220 60 100 60 Z";
const WAVE: &str = "M0 0 C40 60 80 -60 120 0 C160 60 200 -60 240 0 L240 200 \
                    C200 140 160 260 120 200 C80 140 40 260 0 200 Z";

fn outline(svg: &str) -> GlyphPath {
    let path = BezPath::from_svg(svg).unwrap();
    let mut pen = GlyphPathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pen.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pen.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pen.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c0, c1, p) => pen.curve_to(
                c0.x as f32,
                c0.y as f32,
                c1.x as f32,
                c1.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pen.close(),
        }
    }
    pen.finish().unwrap()
}

fn hint(svg: &str, config: &HintConfig, flags: GlyphFlags) -> (GlyphHints, CollectReporter) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut reporter = CollectReporter::default();
    let hints = hint_glyph(&outline(svg), config, flags, &mut reporter).unwrap();
    (hints, reporter)
}

fn spans(hints: &GlyphHints, axis: Axis) -> Vec<(f64, f64)> {
    hints
        .axis_stems(axis)
        .map(|stem| (stem.low.to_f64(), stem.high.to_f64()))
        .collect()
}

/// Checks that groups are well formed and no group holds two overlapping
/// hints on one axis. Ghost hints count as their real edge.
fn assert_consistent(hints: &GlyphHints) {
    assert_eq!(hints.groups.first().map(|group| group.start), Some(0));
    for pair in hints.groups.windows(2) {
        assert!(pair[0].start < pair[1].start);
    }
    for group in &hints.groups {
        assert!(group.start < hints.path.len());
        assert!(group.hints.windows(2).all(|pair| pair[0] < pair[1]));
        for axis in Axis::ALL {
            let mut group_spans = group
                .hints
                .iter()
                .map(|index| &hints.stems[*index])
                .filter(|stem| stem.kind.axis() == axis)
                .map(|stem| match stem.ghost_edge() {
                    Some(edge) => (edge, edge),
                    None => (stem.low, stem.high),
                })
                .collect::<Vec<_>>();
            group_spans.sort();
            for pair in group_spans.windows(2) {
                assert!(
                    pair[0].1 < pair[1].0,
                    "overlapping {axis} hints {:?} in group at {}",
                    pair,
                    group.start
                );
            }
        }
    }
}

#[test]
fn rectangle() {
    let (hints, reporter) = hint(RECT, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(spans(&hints, Axis::Horizontal), [(0.0, 100.0)]);
    assert_eq!(spans(&hints, Axis::Vertical), [(0.0, 100.0)]);
    assert!(!hints.has_substitution());
    assert_eq!(hints.groups[0].hints, [0, 1]);
    assert!(hints.stems.iter().all(|stem| !stem.ghost));
    assert!(reporter
        .stems
        .iter()
        .any(|stem| stem.axis == Axis::Horizontal && stem.width().to_f64() == 100.0));
    let extremes = reporter
        .zones
        .iter()
        .map(|zone| (zone.top, zone.loc.to_f64()))
        .collect::<Vec<_>>();
    assert_eq!(extremes, [(true, 100.0), (false, 0.0)]);
}

#[test]
fn i_beam() {
    let (hints, _) = hint(I_BEAM, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(
        spans(&hints, Axis::Horizontal),
        [(0.0, 60.0), (640.0, 700.0)]
    );
    assert_eq!(spans(&hints, Axis::Vertical), [(120.0, 180.0)]);
    assert_consistent(&hints);
}

#[test]
fn diamond_falls_back_to_bounds() {
    let (hints, reporter) = hint(DIAMOND, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(spans(&hints, Axis::Horizontal), [(0.0, 500.0)]);
    assert_eq!(spans(&hints, Axis::Vertical), [(0.0, 500.0)]);
    assert!(hints.stems.iter().all(|stem| stem.anchors == [None, None]));
    for axis in Axis::ALL {
        assert!(reporter
            .messages
            .contains(&Diagnostic::BoundingBoxFallback { axis }));
    }
}

#[test]
fn flared_edge_keeps_one_hint() {
    let (hints, _) = hint(FLARE, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(spans(&hints, Axis::Horizontal), [(0.0, 100.0)]);
    assert_eq!(spans(&hints, Axis::Vertical), [(0.0, 100.0)]);
}

#[test]
fn stepped_edges_are_removed_as_flares() {
    let flares = |reporter: &CollectReporter| {
        reporter
            .messages
            .iter()
            .filter_map(|m| match m {
                Diagnostic::FlareRemoved { axis, loc, kept } => {
                    Some((*axis, loc.to_f64(), kept.to_f64()))
                }
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    let (hints, reporter) = hint(STEPPED_BAR, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(
        flares(&reporter),
        [(Axis::Horizontal, 6.0, 0.0), (Axis::Horizontal, 106.0, 100.0)]
    );
    assert_eq!(spans(&hints, Axis::Horizontal), [(0.0, 100.0)]);
    assert!(!hints.has_substitution());
    assert_consistent(&hints);

    // without flare removal the stepped half gets a hint of its own
    let config = HintConfig {
        flare_tolerance: pshinter::Fixed::ZERO,
        ..Default::default()
    };
    let (hints, reporter) = hint(STEPPED_BAR, &config, GlyphFlags::default());
    assert!(flares(&reporter).is_empty());
    assert_eq!(
        spans(&hints, Axis::Horizontal),
        [(0.0, 100.0), (6.0, 106.0)]
    );
    assert!(hints.has_substitution());
    assert_consistent(&hints);
}

#[test]
fn overlapping_stems_use_substitution() {
    let (hints, _) = hint(OVERLAPPING, &HintConfig::default(), GlyphFlags::default());
    assert_eq!(
        spans(&hints, Axis::Horizontal),
        [(0.0, 100.0), (50.0, 150.0)]
    );
    assert!(hints.has_substitution());
    // each subpath is controlled by its own horizontal hint
    let second = hints.path.ids().iter().position(|id| {
        hints.path.get(*id).kind() == pshinter::ElementKind::MoveTo && *id != hints.path.ids()[0]
    });
    let active = |position| {
        hints
            .active(position)
            .filter(|stem| stem.kind == HintKind::HStem)
            .map(|stem| (stem.low.to_f64(), stem.high.to_f64()))
            .collect::<Vec<_>>()
    };
    assert_eq!(active(1), [(0.0, 100.0)]);
    assert_eq!(active(second.unwrap() + 1), [(50.0, 150.0)]);
    assert_consistent(&hints);
}

#[test]
fn groups_never_hold_overlapping_hints() {
    let config = HintConfig::default();
    for svg in [
        RECT,
        I_BEAM,
        DIAMOND,
        FLARE,
        STEPPED_BAR,
        OVERLAPPING,
        BOWL,
        RING,
        BOLD_D,
        WAVE,
    ] {
        let (hints, _) = hint(svg, &config, GlyphFlags::default());
        assert_consistent(&hints);
        let (hints, _) = hint(
            svg,
            &config,
            GlyphFlags {
                allow_edits: false,
                ..Default::default()
            },
        );
        assert_consistent(&hints);
    }
}

#[test]
fn bowl_between_disjoint_bars_is_not_split() {
    let original = outline(BOLD_D);
    for allow_edits in [true, false] {
        let flags = GlyphFlags {
            allow_edits,
            ..Default::default()
        };
        let (hints, reporter) = hint(BOLD_D, &HintConfig::default(), flags);
        assert_eq!(
            spans(&hints, Axis::Horizontal),
            [(0.0, 60.0), (440.0, 500.0)]
        );
        assert_eq!(hints.path.len(), original.len());
        assert!(!reporter
            .messages
            .iter()
            .any(|m| matches!(m, Diagnostic::SplitRequested { .. })));
        assert_consistent(&hints);
    }
}

#[test]
fn split_curves_stay_on_the_outline() {
    let (hints, _) = hint(WAVE, &HintConfig::default(), GlyphFlags::default());
    let original = outline(WAVE);
    assert!(hints.path.len() >= original.len());
    let ends = |path: &GlyphPath| {
        path.ids()
            .iter()
            .filter(|id| path.get(**id).kind() != pshinter::ElementKind::CurveTo)
            .map(|id| path.end_point(*id))
            .collect::<Vec<_>>()
    };
    assert_eq!(ends(&hints.path), ends(&original));
}

#[test]
fn alignment_zones_keep_hints_inside_the_glyph() {
    let config = HintConfig {
        top_zones: vec![BlueZone::from_units(500, 510)],
        bottom_zones: vec![BlueZone::from_units(-10, 0)],
        ..Default::default()
    };
    let (hints, _) = hint(RING, &config, GlyphFlags::default());
    assert_consistent(&hints);
    for stem in hints.axis_stems(Axis::Horizontal) {
        let edge = stem.ghost_edge().unwrap_or(stem.low);
        assert!(edge.to_f64() >= -10.0 && edge.to_f64() <= 510.0);
    }
}

#[test]
fn y_down_matches_y_up() {
    let up = HintConfig::default();
    let down = HintConfig {
        y_goes_up: false,
        ..Default::default()
    };
    let flipped = I_BEAM
        .split(' ')
        .map(|token| match token.parse::<i32>() {
            Ok(y) if y != 0 && !token.starts_with(['M', 'L']) => (-y).to_string(),
            _ => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    let (up_hints, _) = hint(I_BEAM, &up, GlyphFlags::default());
    let (down_hints, _) = hint(&flipped, &down, GlyphFlags::default());
    let mut expected = spans(&up_hints, Axis::Horizontal)
        .into_iter()
        .map(|(low, high)| (-high, -low))
        .collect::<Vec<_>>();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(spans(&down_hints, Axis::Horizontal), expected);
    assert_eq!(
        spans(&down_hints, Axis::Vertical),
        spans(&up_hints, Axis::Vertical)
    );
}

#[test]
fn batch_reports_failures_per_glyph() {
    let mut open = GlyphPathBuilder::new();
    open.move_to(0.0, 0.0);
    open.line_to(10.0, 0.0);
    assert!(matches!(
        open.finish(),
        Err(HintError::MissingClosePath { .. })
    ));
    let glyphs = [
        Glyph::new("I", outline(I_BEAM)),
        Glyph::new("empty", GlyphPath::default()),
        Glyph::new("O", outline(RING)),
    ];
    let results = hint_glyphs(&glyphs, &HintConfig::default());
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert_eq!(results[1], Err(HintError::EmptyPath));
    assert!(results[2].is_ok());
}

#[cfg(feature = "serde")]
#[test]
fn hint_output_round_trip() {
    let (hints, _) = hint(OVERLAPPING, &HintConfig::default(), GlyphFlags::default());
    let json = serde_json::to_string(&(&hints.stems, &hints.groups)).unwrap();
    let (stems, groups): (Vec<pshinter::HintPoint>, Vec<pshinter::HintGroup>) =
        serde_json::from_str(&json).unwrap();
    assert_eq!(stems, hints.stems);
    assert_eq!(groups, hints.groups);
}

#[cfg(feature = "serde")]
#[test]
fn config_round_trip() {
    let config = HintConfig {
        top_zones: vec![BlueZone::from_units(700, 710)],
        bottom_zones: vec![BlueZone::from_units(-10, 0)],
        h_stems: vec![pshinter::Fixed::from_i32(60)],
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: HintConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
