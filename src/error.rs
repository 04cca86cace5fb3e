//! Crate-wide error type.
//!
//! Mirrors the teacher's `DistError` (a plain, dependency-free enum) but
//! widened to the error kinds the statistical core actually raises. No
//! external error crate is pulled in: `std::error::Error` is implemented
//! by hand, matching the zero-dependency posture of the rest of the crate.

use std::fmt;

/// Error kind raised by a fallible constructor or operation in this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Structural violation: null/empty input, size mismatch, non-positive tolerance.
    InvalidArgument(String),
    /// Numeric bound violation: probability outside `[0,1]`, negative sigma, cast overflow.
    OutOfRange(String),
    /// `b <= a` (or `x1 > x2`) where a strictly ordered pair was required.
    InvalidRange(String),
    /// A covariance/correlation matrix failed a positive-semidefiniteness check.
    NotPositiveSemidefinite(String),
    /// A solver request could not be satisfied (e.g. variance fraction too high).
    ImpossibleConstraints(String),
    /// Conditioning on a zero-probability event.
    ImpossibleCondition(String),
    /// Read before the first event, past a sparse history's logical end, or an
    /// empty running-statistics query.
    NoData(String),
    /// A probability vector failed to normalize within tolerance.
    SumNotOne(String),
    /// A method-of-moments or maximum-likelihood estimator rejected the sample.
    EstimationFailed(String),
    /// Explicit unsupported combination of parameters.
    NotImplemented(String),
    /// A deterministic ("precomputed") RNG ran out of samples.
    Exhausted,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            CoreError::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            CoreError::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            CoreError::NotPositiveSemidefinite(msg) => {
                write!(f, "not positive semidefinite: {msg}")
            }
            CoreError::ImpossibleConstraints(msg) => write!(f, "impossible constraints: {msg}"),
            CoreError::ImpossibleCondition(msg) => write!(f, "impossible condition: {msg}"),
            CoreError::NoData(msg) => write!(f, "no data: {msg}"),
            CoreError::SumNotOne(msg) => write!(f, "probabilities do not sum to one: {msg}"),
            CoreError::EstimationFailed(msg) => write!(f, "estimation failed: {msg}"),
            CoreError::NotImplemented(msg) => write!(f, "not implemented: {msg}"),
            CoreError::Exhausted => write!(f, "random number generator exhausted"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<crate::dist::DistError> for CoreError {
    fn from(e: crate::dist::DistError) -> Self {
        CoreError::InvalidArgument(e.to_string())
    }
}

impl CoreError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidArgument(msg.into())
    }
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        CoreError::OutOfRange(msg.into())
    }
    pub fn invalid_range<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidRange(msg.into())
    }
}
