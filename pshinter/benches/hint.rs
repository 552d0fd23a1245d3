use criterion::{criterion_group, criterion_main, Criterion};
use pshinter::{
    hint_glyph, hint_glyphs, BlueZone, Fixed, Glyph, GlyphFlags, GlyphPath, GlyphPathBuilder,
    HintConfig, OutlinePen,
};

/// Letter shapes drawn with lines and cubics on a 1000 unit em.
const GLYPHS: &[(&str, &str)] = &[
    (
        "I",
        "M5 0 L295 0 L295 60 L180 60 L180 640 L300 640 L300 700 L0 700 L0 640 L120 640 \
         L120 60 L5 60 Z",
    ),
    (
        "O",
        "M250 -10 C388 -10 500 112 500 250 C500 388 388 510 250 510 C112 510 0 388 0 250 \
         C0 112 112 -10 250 -10 Z M250 70 C156 70 80 156 80 250 C80 344 156 430 250 430 \
         C344 430 420 344 420 250 C420 156 344 70 250 70 Z",
    ),
    (
        "E",
        "M80 0 L450 0 L450 70 L160 70 L160 320 L400 320 L400 390 L160 390 L160 630 L440 630 \
         L440 700 L80 700 Z",
    ),
    (
        "S",
        "M60 120 C100 40 180 -10 270 -10 C390 -10 470 60 470 170 C470 280 390 320 280 350 \
         C190 375 150 400 150 460 C150 520 200 560 270 560 C330 560 380 530 410 480 L460 520 \
         C420 590 350 630 270 630 C160 630 80 560 80 460 C80 360 160 320 260 290 \
         C350 265 400 240 400 170 C400 100 340 60 270 60 C200 60 140 100 110 160 Z",
    ),
];

fn outline(svg: &str) -> GlyphPath {
    let path = kurbo::BezPath::from_svg(svg).unwrap();
    let mut pen = GlyphPathBuilder::new();
    for el in path.elements() {
        match *el {
            kurbo::PathEl::MoveTo(p) => pen.move_to(p.x as f32, p.y as f32),
            kurbo::PathEl::LineTo(p) => pen.line_to(p.x as f32, p.y as f32),
            kurbo::PathEl::QuadTo(c, p) => {
                pen.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
            }
            kurbo::PathEl::CurveTo(c0, c1, p) => pen.curve_to(
                c0.x as f32,
                c0.y as f32,
                c1.x as f32,
                c1.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            kurbo::PathEl::ClosePath => pen.close(),
        }
    }
    pen.finish().unwrap()
}

fn config() -> HintConfig {
    HintConfig {
        top_zones: vec![
            BlueZone::from_units(500, 510),
            BlueZone::from_units(700, 710),
        ],
        bottom_zones: vec![BlueZone::from_units(-10, 0)],
        h_stems: vec![Fixed::from_i32(70)],
        v_stems: vec![Fixed::from_i32(80)],
        ..Default::default()
    }
}

fn hint(c: &mut Criterion) {
    let config = config();
    for (name, svg) in GLYPHS {
        let path = outline(svg);
        c.bench_function(name, |b| {
            b.iter(|| hint_glyph(&path, &config, GlyphFlags::default(), &mut ()).unwrap())
        });
    }
    let glyphs = GLYPHS
        .iter()
        .map(|(name, svg)| Glyph::new(*name, outline(svg)))
        .collect::<Vec<_>>();
    c.bench_function("batch", |b| b.iter(|| hint_glyphs(&glyphs, &config)));
}

criterion_group!(benches, hint);
criterion_main!(benches);
