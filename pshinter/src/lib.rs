//! Stem and alignment zone hint generation for PostScript style glyph
//! outlines.
//!
//! Given a closed outline made of lines and cubic curves, pshinter finds
//! the horizontal and vertical stems of the glyph, picks a non overlapping
//! set of them per axis and partitions the outline into substitution
//! groups so that every element is controlled by hints that do not
//! conflict with each other.
//!
//! Outlines are built through the [`OutlinePen`] interface implemented by
//! [`GlyphPathBuilder`] (or, with the `kurbo` feature, converted from a
//! `kurbo::BezPath`). Font wide settings such as alignment zones and
//! dominant stem widths are supplied in a [`HintConfig`] and per glyph
//! decisions in [`GlyphFlags`].
//!
//! ```
//! use pshinter::{hint_glyph, GlyphFlags, GlyphPathBuilder, HintConfig, OutlinePen};
//!
//! let mut pen = GlyphPathBuilder::new();
//! pen.move_to(0.0, 0.0);
//! pen.line_to(100.0, 0.0);
//! pen.line_to(100.0, 100.0);
//! pen.line_to(0.0, 100.0);
//! pen.close();
//! let path = pen.finish().unwrap();
//! let hints = hint_glyph(&path, &HintConfig::default(), GlyphFlags::default(), &mut ()).unwrap();
//! assert_eq!(hints.stems.len(), 2);
//! ```
//!
//! Advisory output (near misses, requested splits, stem statistics) is
//! delivered to a [`Reporter`] and never aborts hinting.

#![forbid(unsafe_code)]

pub mod flatten;
pub mod geometry;

mod config;
mod conflict;
mod context;
mod counter;
mod error;
mod eval;
mod fixed;
mod hints;
mod merge;
mod passes;
mod path;
mod pen;
mod pick;
mod prune;
mod report;
mod segments;
mod values;

pub use config::{BlueZone, GlyphFlags, HintConfig};
pub use error::{HintError, RetryReason};
pub use fixed::Fixed;
pub use geometry::{Axis, Point, Rect};
pub use hints::{
    GlyphHints, HintGroup, HintKind, HintPoint, BOTTOM_GHOST_WIDTH, TOP_GHOST_WIDTH,
};
pub use path::{ElementId, ElementKind, GlyphPath, PathElement, Subpath};
pub use pen::{GlyphPathBuilder, OutlinePen, MAX_COORDINATE};
pub use report::{
    CollectReporter, Diagnostic, Fixup, LogReporter, Reporter, StemReport, ZoneReport,
};

use context::GlyphContext;
use error::PassError;

/// Computes the hints of one glyph.
///
/// The glyph is hinted from its outline and, when a pass asks for it, hinted
/// again with counter hints disabled on the failing axis or with near miss
/// coordinates nudged. The last permitted attempt runs with both disabled.
pub fn hint_glyph(
    path: &GlyphPath,
    config: &HintConfig,
    flags: GlyphFlags,
    reporter: &mut dyn Reporter,
) -> Result<GlyphHints, HintError> {
    config.validate()?;
    if path.len() > config.max_elements {
        return Err(HintError::TooManyElements {
            limit: config.max_elements,
        });
    }
    if !path.iter().any(|(_, element)| element.is_drawing()) {
        return Err(HintError::EmptyPath);
    }
    let flip = !config.y_goes_up;
    let flipped;
    let mut base = path.clone();
    let config = if flip {
        base.flip_y();
        flipped = config.flipped();
        &flipped
    } else {
        config
    };
    let mut flags = flags;
    let attempts = config.max_retries + 1;
    for attempt in 0..attempts {
        if attempt > 0 {
            reporter.message(&Diagnostic::Retry { attempt });
            if attempt + 1 == attempts {
                flags.h_counter = false;
                flags.v_counter = false;
                flags.fix_near_misses = false;
            }
        }
        match GlyphContext::new(base.clone(), config, flags, reporter).run() {
            Ok(mut hints) => {
                if flip {
                    hints.flip_y();
                }
                return Ok(hints);
            }
            Err(PassError::Fatal(error)) => return Err(error),
            Err(PassError::Retry(RetryReason::CounterHintsFailed(axis))) => {
                log::debug!("{axis}: retrying without counter hints");
                flags.disable_counter(axis);
            }
            Err(PassError::Retry(RetryReason::NearMisses(fixups))) => {
                let count = fixups.iter().map(|fixup| base.apply_fixup(fixup)).sum();
                reporter.message(&Diagnostic::FixupsApplied { count });
                flags.fix_near_misses = false;
            }
        }
    }
    Err(HintError::RetryLimit { attempts })
}

/// Named outline with its per glyph flags.
#[derive(Clone, Debug)]
pub struct Glyph {
    pub name: String,
    pub path: GlyphPath,
    pub flags: GlyphFlags,
}

impl Glyph {
    pub fn new(name: impl Into<String>, path: GlyphPath) -> Self {
        Self {
            name: name.into(),
            path,
            flags: GlyphFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: GlyphFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Hints a batch of glyphs with a shared configuration.
///
/// Results are returned in input order. A failing glyph yields an `Err`
/// item and does not affect the others. Diagnostics go to the `log`
/// facade, prefixed with the glyph name.
pub fn hint_glyphs(glyphs: &[Glyph], config: &HintConfig) -> Vec<Result<GlyphHints, HintError>> {
    let hint = |glyph: &Glyph| {
        let mut reporter = LogReporter::new(glyph.name.as_str());
        let result = hint_glyph(&glyph.path, config, glyph.flags, &mut reporter);
        if let Err(error) = &result {
            log::warn!("{}: {error}", glyph.name);
        }
        result
    };
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        glyphs.par_iter().map(hint).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        glyphs.iter().map(hint).collect()
    }
}
