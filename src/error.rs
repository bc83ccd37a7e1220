//! Errors returned when constructing a sampler.

/// Error type returned from the [`BernoulliSampler`][crate::BernoulliSampler]
/// constructors.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// The probability was NaN, below `0.0`, or above `1.0`.
    #[error("probability {0} is NaN or outside the interval [0, 1]")]
    InvalidProbability(f64),
}

/// A `Result` whose error defaults to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
