use snafu::Snafu;

/// Expected limitations of an attribution method.
///
/// These are part of the contract of the methods that raise them: a caller is
/// expected to either handle them or to configure a contingency.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttributionFailure {
    #[snafu(display("no candidate reached the eligibility threshold of {threshold}"))]
    BelowThreshold { threshold: f64 },
    #[snafu(display("no candidate received any vote"))]
    NoSupport {},
    #[snafu(display("no candidate received more than {threshold} of the votes"))]
    NoMajority { threshold: f64 },
    /// No candidate wins all its pairwise comparisons.
    #[snafu(display("standoff: no candidate beats every other candidate"))]
    Standoff {},
}

/// Errors that prevent an attribution from completing.
///
/// Only [`AttributionError::Failure`] is an expected outcome. The other variants
/// indicate invalid tallies or an invalid configuration and are never turned
/// into a failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttributionError {
    #[snafu(display("{source}"), context(false))]
    Failure { source: AttributionFailure },

    #[snafu(display("the tally does not contain any candidate"))]
    EmptyTally {},

    #[snafu(display("the tally does not contain any vote"))]
    ZeroVotes {},

    #[snafu(display("ballot #{index} ranks candidate {candidate} more than once"))]
    DuplicateRanking { index: usize, candidate: String },

    #[snafu(display("expected {expected} grades for candidate {candidate}, got {actual}"))]
    GradeCountMismatch {
        candidate: String,
        expected: usize,
        actual: usize,
    },

    #[snafu(display("invalid configuration: {message}"))]
    InvalidConfig { message: String },

    #[snafu(display("no result after {rounds} rounds"))]
    NoConvergence { rounds: usize },
}

impl AttributionError {
    /// The expected failure, if this error is one.
    pub fn failure(&self) -> Option<&AttributionFailure> {
        match self {
            AttributionError::Failure { source } => Some(source),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }
}

pub type AttributionResult<T> = Result<T, AttributionError>;
