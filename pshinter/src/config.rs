//! Font wide hinting parameters and per glyph flags.

use super::{error::HintError, fixed::Fixed, geometry::Axis};

/// Alignment zone covering `bottom..=top` in font units.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlueZone {
    pub bottom: Fixed,
    pub top: Fixed,
}

impl BlueZone {
    pub fn new(bottom: Fixed, top: Fixed) -> Self {
        Self { bottom, top }
    }

    /// Creates a zone from integer font units.
    pub fn from_units(bottom: i32, top: i32) -> Self {
        Self::new(Fixed::from_i32(bottom), Fixed::from_i32(top))
    }

    /// Returns true if `loc` lies within the zone widened by `margin`.
    pub fn contains(&self, loc: Fixed, margin: Fixed) -> bool {
        loc >= self.bottom - margin && loc <= self.top + margin
    }
}

/// Immutable configuration snapshot shared by every glyph of a font.
///
/// All distances are in font units. Weights are unitless scores.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HintConfig {
    // -- Font tables --
    /// True if y increases upward in the input outlines.
    pub y_goes_up: bool,
    /// Alignment zones for tops of features (cap height, x height, ...).
    pub top_zones: Vec<BlueZone>,
    /// Alignment zones for bottoms of features (baseline, descender, ...).
    pub bottom_zones: Vec<BlueZone>,
    /// Dominant widths of horizontal stems.
    pub h_stems: Vec<Fixed>,
    /// Dominant widths of vertical stems.
    pub v_stems: Vec<Fixed>,

    // -- Segment generation --
    /// Half width of the band used to measure how long a curve stays
    /// flat near an aligned control handle.
    pub curve_band: Fixed,
    /// Length of the synthetic segment placed at a sharp bend.
    pub bend_length: Fixed,
    /// Segments of one list whose locations differ by at most this are
    /// compacted into one.
    pub compact_tolerance: Fixed,
    /// Span ratio above which a co-located bend segment is discarded.
    pub extra_bend_ratio: f64,
    /// Interior angle, in degrees, below which a corner is reported as
    /// sharp.
    pub sharp_angle: f64,
    /// Flattening tolerance.
    pub flatten_tolerance: Fixed,
    /// Flattening depth, clamped to [`crate::flatten::MAX_DEPTH`].
    pub flatten_depth: u8,

    // -- Evaluation --
    /// Pairs closer than this are not stems.
    pub min_stem_width: Fixed,
    /// Lower bound of the distance past which weights fall off sharply.
    pub min_big_dist: Fixed,
    /// Smallest weight assigned to a surviving pair.
    pub min_weight: f64,
    /// Largest weight assigned to any pair.
    pub max_weight: f64,
    /// Margin added around alignment zones for membership tests.
    pub band_margin: Fixed,
    /// Priority added when a segment lies in an alignment zone.
    pub band_priority: i32,
    /// Width of a synthesized ghost stem.
    pub ghost_width: Fixed,
    /// Weight of a synthesized ghost stem.
    pub ghost_weight: f64,
    /// Distance within which a width or location counts as a near miss.
    pub near_miss_tolerance: Fixed,

    // -- Pruning and merging --
    /// Weight ratio by which a candidate must dominate another to prune it.
    pub prune_factor: f64,
    /// Slack allowed when testing span subsumption and path closeness.
    pub prune_margin: Fixed,
    /// Maximum difference of the unshared edge when merging candidates
    /// that share the other edge.
    pub merge_distance: Fixed,
    /// Maximum difference of both edges when merging candidates.
    pub bend_merge_tolerance: Fixed,

    // -- Selection --
    /// Soft factor used when comparing priorities of weighted candidates.
    pub priority_factor: f64,
    /// Ghost weights are shifted right by this many bits when compared
    /// against real candidates. Zero disables the adjustment.
    pub ghost_shift: u32,
    /// Minimum gap between two selected stems on one axis.
    pub hint_margin: Fixed,
    /// Weight at or above which a zero priority candidate is always
    /// admitted.
    pub weight_floor: f64,
    /// A weak zero priority candidate is admitted if its weight times this
    /// factor reaches the weight of the previous pick.
    pub admit_ratio: f64,
    /// Minimum initial weight of a real candidate replacing a ghost pick.
    pub ghost_substitute_weight: f64,

    // -- Conflict resolution and secondary passes --
    /// Weight ratio below which the weaker of two conflicting attachments
    /// is dropped outright.
    pub conflict_weak_ratio: f64,
    /// Maximum number of curve splits per glyph.
    pub max_splits: usize,
    /// Maximum location difference of a flare.
    pub flare_tolerance: Fixed,
    /// Weight at or above which a flare hint is kept.
    pub flare_keep_weight: f64,
    /// Elements shorter than this carry no hints of their own.
    pub min_element_length: Fixed,
    /// Path distance over which hints are copied onto tiny neighbors.
    pub promote_distance: Fixed,
    /// Symmetry tolerance for counter hints.
    pub counter_tolerance: Fixed,
    /// Relaxed symmetry tolerance for counter hints.
    pub counter_relaxed_tolerance: Fixed,
    /// Ratio by which the third counter candidate must outweigh a fourth.
    pub counter_weight_ratio: f64,

    // -- Limits --
    /// Maximum number of near miss fix-ups applied to one glyph.
    pub max_fixups: usize,
    /// Maximum number of times a glyph is re-run.
    pub max_retries: usize,
    /// Maximum number of iterations of the conflict and flare passes.
    pub max_pass_iterations: usize,
    /// Maximum number of path elements in one glyph.
    pub max_elements: usize,
    /// Maximum number of segments generated for one axis.
    pub max_segments: usize,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            y_goes_up: true,
            top_zones: vec![],
            bottom_zones: vec![],
            h_stems: vec![],
            v_stems: vec![],
            curve_band: Fixed::from_i32(2),
            bend_length: Fixed::from_i32(2),
            compact_tolerance: Fixed::ZERO,
            extra_bend_ratio: 3.0,
            sharp_angle: 12.0,
            flatten_tolerance: Fixed::from_f64(0.5),
            flatten_depth: crate::flatten::MAX_DEPTH,
            min_stem_width: Fixed::from_i32(5),
            min_big_dist: Fixed::from_i32(150),
            min_weight: 1.0 / 256.0,
            max_weight: 8_000_000.0,
            band_margin: Fixed::ZERO,
            band_priority: 2,
            ghost_width: Fixed::from_i32(20),
            ghost_weight: 1000.0,
            near_miss_tolerance: Fixed::from_i32(2),
            prune_factor: 3.0,
            prune_margin: Fixed::from_i32(3),
            merge_distance: Fixed::from_i32(4),
            bend_merge_tolerance: Fixed::from_i32(2),
            priority_factor: 20.0,
            ghost_shift: 1,
            hint_margin: Fixed::from_i32(2),
            weight_floor: 10.0,
            admit_ratio: 100.0,
            ghost_substitute_weight: 50.0,
            conflict_weak_ratio: 10.0,
            max_splits: 32,
            flare_tolerance: Fixed::from_i32(10),
            flare_keep_weight: 1000.0,
            min_element_length: Fixed::from_i32(4),
            promote_distance: Fixed::from_i32(8),
            counter_tolerance: Fixed::ONE,
            counter_relaxed_tolerance: Fixed::from_i32(3),
            counter_weight_ratio: 10.0,
            max_fixups: 16,
            max_retries: 3,
            max_pass_iterations: 32,
            max_elements: 4096,
            max_segments: 2000,
        }
    }
}

impl HintConfig {
    /// Checks the tables and tolerances for consistency.
    pub fn validate(&self) -> Result<(), HintError> {
        for (kind, zones) in [("top", &self.top_zones), ("bottom", &self.bottom_zones)] {
            for zone in zones {
                if zone.bottom > zone.top {
                    return Err(HintError::InvalidConfig(format!(
                        "{kind} zone bottom {} is above its top {}",
                        zone.bottom, zone.top
                    )));
                }
            }
        }
        for (kind, stems) in [("horizontal", &self.h_stems), ("vertical", &self.v_stems)] {
            if let Some(width) = stems.iter().find(|w| **w <= Fixed::ZERO) {
                return Err(HintError::InvalidConfig(format!(
                    "{kind} stem width {width} is not positive"
                )));
            }
        }
        let tolerances = [
            ("curve_band", self.curve_band),
            ("bend_length", self.bend_length),
            ("compact_tolerance", self.compact_tolerance),
            ("flatten_tolerance", self.flatten_tolerance),
            ("min_stem_width", self.min_stem_width),
            ("min_big_dist", self.min_big_dist),
            ("band_margin", self.band_margin),
            ("ghost_width", self.ghost_width),
            ("near_miss_tolerance", self.near_miss_tolerance),
            ("prune_margin", self.prune_margin),
            ("merge_distance", self.merge_distance),
            ("bend_merge_tolerance", self.bend_merge_tolerance),
            ("hint_margin", self.hint_margin),
            ("flare_tolerance", self.flare_tolerance),
            ("min_element_length", self.min_element_length),
            ("promote_distance", self.promote_distance),
            ("counter_tolerance", self.counter_tolerance),
            ("counter_relaxed_tolerance", self.counter_relaxed_tolerance),
        ];
        if let Some((name, _)) = tolerances.iter().find(|(_, value)| *value < Fixed::ZERO) {
            return Err(HintError::InvalidConfig(format!("{name} is negative")));
        }
        if self.ghost_width == Fixed::ZERO {
            return Err(HintError::InvalidConfig("ghost_width is zero".into()));
        }
        if !(self.min_weight > 0.0 && self.min_weight <= self.max_weight) {
            return Err(HintError::InvalidConfig(format!(
                "weight bounds {}..{} are invalid",
                self.min_weight, self.max_weight
            )));
        }
        let factors = [
            ("extra_bend_ratio", self.extra_bend_ratio),
            ("prune_factor", self.prune_factor),
            ("priority_factor", self.priority_factor),
            ("admit_ratio", self.admit_ratio),
            ("conflict_weak_ratio", self.conflict_weak_ratio),
            ("counter_weight_ratio", self.counter_weight_ratio),
            ("ghost_weight", self.ghost_weight),
        ];
        if let Some((name, _)) = factors.iter().find(|(_, value)| !(*value > 0.0)) {
            return Err(HintError::InvalidConfig(format!("{name} must be positive")));
        }
        Ok(())
    }

    /// Dominant stem widths for hints on `axis`.
    pub fn stems(&self, axis: Axis) -> &[Fixed] {
        match axis {
            Axis::Horizontal => &self.h_stems,
            Axis::Vertical => &self.v_stems,
        }
    }

    /// Stem width past which weights fall off with the eighth power of
    /// distance.
    pub fn big_dist(&self, axis: Axis) -> Fixed {
        let widest = self.stems(axis).iter().copied().max().unwrap_or_default();
        (widest * 23 / 20).max(self.min_big_dist)
    }

    /// Returns the index of the top zone containing `loc`.
    pub fn top_zone(&self, loc: Fixed) -> Option<usize> {
        self.top_zones
            .iter()
            .position(|zone| zone.contains(loc, self.band_margin))
    }

    /// Returns the index of the bottom zone containing `loc`.
    pub fn bottom_zone(&self, loc: Fixed) -> Option<usize> {
        self.bottom_zones
            .iter()
            .position(|zone| zone.contains(loc, self.band_margin))
    }

    /// Returns a copy of the configuration for outlines with y negated.
    pub(crate) fn flipped(&self) -> Self {
        let flip = |zones: &[BlueZone]| {
            zones
                .iter()
                .map(|zone| BlueZone::new(-zone.top, -zone.bottom))
                .collect::<Vec<_>>()
        };
        Self {
            top_zones: flip(&self.top_zones),
            bottom_zones: flip(&self.bottom_zones),
            y_goes_up: true,
            ..self.clone()
        }
    }
}

/// Per glyph decisions made by the caller, typically from glyph name lists.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GlyphFlags {
    /// Try horizontal counter hints.
    pub h_counter: bool,
    /// Try vertical counter hints.
    pub v_counter: bool,
    /// Ignore alignment zones for this glyph.
    pub no_blues: bool,
    /// Boost priority of segments at the start and end of each subpath.
    pub sol_eol: bool,
    /// Permit splitting curves to resolve conflicts.
    pub allow_edits: bool,
    /// Nudge near miss coordinates and hint again.
    pub fix_near_misses: bool,
}

impl Default for GlyphFlags {
    fn default() -> Self {
        Self {
            h_counter: false,
            v_counter: false,
            no_blues: false,
            sol_eol: false,
            allow_edits: true,
            fix_near_misses: false,
        }
    }
}

impl GlyphFlags {
    /// Returns true if counter hints are requested for `axis`.
    pub fn counter(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.h_counter,
            Axis::Vertical => self.v_counter,
        }
    }

    pub(crate) fn disable_counter(&mut self, axis: Axis) {
        match axis {
            Axis::Horizontal => self.h_counter = false,
            Axis::Vertical => self.v_counter = false,
        }
    }
}
