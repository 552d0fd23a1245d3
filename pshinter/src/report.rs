//! Advisory output produced while hinting.
//!
//! Nothing reported here aborts hinting. Callers choose what to do with the
//! messages by supplying a [`Reporter`]; [`LogReporter`] forwards them to
//! the `log` facade and [`CollectReporter`] keeps them for inspection.

use super::{fixed::Fixed, geometry::Axis};
use core::fmt;

/// Proposed adjustment of outline coordinates.
///
/// Every coordinate on `axis` equal to `from` is moved to `to`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Fixup {
    pub axis: Axis,
    pub from: Fixed,
    pub to: Fixed,
}

/// Recoverable anomaly or near miss found in a glyph.
#[derive(Clone, PartialEq, Debug)]
pub enum Diagnostic {
    /// Two elements meet at a very acute angle.
    SharpAngle { x: Fixed, y: Fixed, degrees: f64 },
    /// A line is close to, but not exactly, aligned with an axis.
    NotAxisAligned {
        axis: Axis,
        from: (Fixed, Fixed),
        to: (Fixed, Fixed),
    },
    /// A path walk visited more elements than the path holds.
    PossibleLoop { walk: &'static str },
    /// A subpath repeats an earlier one and was ignored.
    DuplicateSubpath { index: usize },
    /// A stem is within tolerance of a dominant width without matching it.
    StemNearMiss {
        axis: Axis,
        width: Fixed,
        dominant: Fixed,
    },
    /// A segment lies just outside an alignment zone.
    BandNearMiss { loc: Fixed, edge: Fixed },
    /// Conflicting hints on an element need a manual split.
    SplitRequested { axis: Axis, x: Fixed, y: Fixed },
    /// The candidates do not form a symmetric counter group.
    CounterHintFailed { axis: Axis },
    /// A counter group only passed the relaxed symmetry test.
    RelaxedCounter { axis: Axis },
    /// A hint on an edge a few units from a stronger one was dropped.
    FlareRemoved { axis: Axis, loc: Fixed, kept: Fixed },
    /// The pass limit was reached before conflicts settled.
    PassLimit { iterations: usize },
    /// No stem was found and the bounding box was hinted instead.
    BoundingBoxFallback { axis: Axis },
    /// Near miss coordinates were nudged.
    FixupsApplied { count: usize },
    /// The glyph is being hinted again.
    Retry { attempt: usize },
}

impl Diagnostic {
    /// True for messages that deserve the attention of a font developer.
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            Self::RelaxedCounter { .. }
                | Self::FlareRemoved { .. }
                | Self::BoundingBoxFallback { .. }
                | Self::FixupsApplied { .. }
                | Self::Retry { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SharpAngle { x, y, degrees } => {
                write!(f, "sharp angle of {degrees:.1} degrees at ({x}, {y})")
            }
            Self::NotAxisAligned { axis, from, to } => write!(
                f,
                "line ({}, {}) -> ({}, {}) is not exactly {axis}",
                from.0, from.1, to.0, to.1
            ),
            Self::PossibleLoop { walk } => write!(f, "possible loop in {walk}"),
            Self::DuplicateSubpath { index } => {
                write!(f, "subpath {index} duplicates an earlier subpath")
            }
            Self::StemNearMiss {
                axis,
                width,
                dominant,
            } => write!(
                f,
                "{axis} stem width {width} is near the dominant width {dominant}"
            ),
            Self::BandNearMiss { loc, edge } => {
                write!(f, "location {loc} is near the alignment zone edge {edge}")
            }
            Self::SplitRequested { axis, x, y } => write!(
                f,
                "conflicting {axis} hints at ({x}, {y}); consider adding a point"
            ),
            Self::CounterHintFailed { axis } => {
                write!(f, "{axis} counter hints are not symmetric")
            }
            Self::RelaxedCounter { axis } => {
                write!(f, "{axis} counter hints use the relaxed tolerance")
            }
            Self::FlareRemoved { axis, loc, kept } => {
                write!(f, "removed {axis} flare hint at {loc} next to {kept}")
            }
            Self::PassLimit { iterations } => {
                write!(f, "hint passes did not settle after {iterations} iterations")
            }
            Self::BoundingBoxFallback { axis } => {
                write!(f, "no {axis} stems found; hinting the bounding box")
            }
            Self::FixupsApplied { count } => write!(f, "applied {count} near miss fix-ups"),
            Self::Retry { attempt } => write!(f, "hinting again (attempt {attempt})"),
        }
    }
}

/// Candidate stem measured by the evaluator.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct StemReport {
    pub axis: Axis,
    pub low: Fixed,
    pub high: Fixed,
    pub weight: f64,
}

impl StemReport {
    pub fn width(&self) -> Fixed {
        self.high - self.low
    }
}

/// Extreme edge of a glyph, used to derive alignment zones.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ZoneReport {
    /// True for the highest top edge, false for the lowest bottom edge.
    pub top: bool,
    pub loc: Fixed,
    /// Extent of the edge along the x axis.
    pub min: Fixed,
    pub max: Fixed,
}

/// Receiver for advisory output.
///
/// All methods have empty default implementations.
pub trait Reporter {
    /// Called for every evaluated stem candidate.
    fn report_stem(&mut self, stem: &StemReport) {
        let _ = stem;
    }

    /// Called with the top and bottom extremes of a glyph.
    fn report_zone(&mut self, zone: &ZoneReport) {
        let _ = zone;
    }

    /// Called for every anomaly and near miss.
    fn message(&mut self, diagnostic: &Diagnostic) {
        let _ = diagnostic;
    }
}

/// Reporter that discards everything.
impl Reporter for () {}

/// Reporter that forwards messages to the `log` facade.
#[derive(Clone, Default, Debug)]
pub struct LogReporter {
    glyph: String,
}

impl LogReporter {
    /// Creates a reporter that prefixes messages with a glyph name.
    pub fn new(glyph: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
        }
    }
}

impl Reporter for LogReporter {
    fn report_stem(&mut self, stem: &StemReport) {
        log::trace!(
            "{}: {} stem {}..{} weight {:.3}",
            self.glyph,
            stem.axis,
            stem.low,
            stem.high,
            stem.weight
        );
    }

    fn report_zone(&mut self, zone: &ZoneReport) {
        log::trace!(
            "{}: {} extreme at {} ({}..{})",
            self.glyph,
            if zone.top { "top" } else { "bottom" },
            zone.loc,
            zone.min,
            zone.max
        );
    }

    fn message(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.is_warning() {
            log::warn!("{}: {diagnostic}", self.glyph);
        } else {
            log::debug!("{}: {diagnostic}", self.glyph);
        }
    }
}

/// Reporter that accumulates everything it receives.
#[derive(Clone, Default, Debug)]
pub struct CollectReporter {
    pub stems: Vec<StemReport>,
    pub zones: Vec<ZoneReport>,
    pub messages: Vec<Diagnostic>,
}

impl Reporter for CollectReporter {
    fn report_stem(&mut self, stem: &StemReport) {
        self.stems.push(*stem);
    }

    fn report_zone(&mut self, zone: &ZoneReport) {
        self.zones.push(*zone);
    }

    fn message(&mut self, diagnostic: &Diagnostic) {
        self.messages.push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let diag = Diagnostic::StemNearMiss {
            axis: Axis::Vertical,
            width: Fixed::from_i32(79),
            dominant: Fixed::from_i32(80),
        };
        assert_eq!(
            diag.to_string(),
            "vertical stem width 79 is near the dominant width 80"
        );
        assert!(diag.is_warning());
        assert!(!Diagnostic::Retry { attempt: 1 }.is_warning());
        let flare = Diagnostic::FlareRemoved {
            axis: Axis::Horizontal,
            loc: Fixed::from_i32(108),
            kept: Fixed::from_i32(100),
        };
        assert_eq!(
            flare.to_string(),
            "removed horizontal flare hint at 108 next to 100"
        );
        assert!(!flare.is_warning());
    }

    #[test]
    fn collect() {
        let mut reporter = CollectReporter::default();
        reporter.message(&Diagnostic::PossibleLoop { walk: "test" });
        reporter.report_stem(&StemReport {
            axis: Axis::Horizontal,
            low: Fixed::ZERO,
            high: Fixed::from_i32(50),
            weight: 1.0,
        });
        assert_eq!(reporter.messages.len(), 1);
        assert_eq!(reporter.stems[0].width(), Fixed::from_i32(50));
    }
}
