//! Error types associated with hinting.

use super::{geometry::Axis, report::Fixup};
use thiserror::Error;

/// Errors that abort hinting of a glyph.
#[derive(Error, Clone, PartialEq, Debug)]
#[non_exhaustive]
pub enum HintError {
    #[error("subpath ending at ({x}, {y}) is not closed")]
    MissingClosePath { x: f64, y: f64 },

    #[error("expected a move to before the command ending at ({x}, {y})")]
    ExpectedMoveTo { x: f64, y: f64 },

    #[error("outline has no drawing commands")]
    EmptyPath,

    #[error("coordinate of path command {index} is not finite or out of range")]
    MalformedPoint { index: usize },

    #[error("outline exceeds the limit of {limit} path elements")]
    TooManyElements { limit: usize },

    #[error("outline exceeds the limit of {limit} segments per axis")]
    TooManySegments { limit: usize },

    #[error("glyph could not be hinted within {attempts} attempts")]
    RetryLimit { attempts: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons for hinting a glyph again from its base outline.
#[derive(Clone, PartialEq, Debug)]
pub enum RetryReason {
    /// The symmetry test for counter hints failed on this axis.
    CounterHintsFailed(Axis),
    /// Near miss coordinates should be nudged before hinting again.
    NearMisses(Vec<Fixup>),
}

/// Outcome of a failed pass over one glyph.
#[derive(Clone, PartialEq, Debug)]
pub(crate) enum PassError {
    Fatal(HintError),
    Retry(RetryReason),
}

impl From<HintError> for PassError {
    fn from(value: HintError) -> Self {
        Self::Fatal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_coordinates() {
        let err = HintError::MissingClosePath { x: 10.0, y: -2.5 };
        assert_eq!(err.to_string(), "subpath ending at (10, -2.5) is not closed");
        let pass: PassError = HintError::EmptyPath.into();
        assert_eq!(pass, PassError::Fatal(HintError::EmptyPath));
    }
}
