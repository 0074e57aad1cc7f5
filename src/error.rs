//! Error types for normalization, caching and selection.

use rust_decimal::Decimal;

/// Errors returned by [`normalize`](crate::normalize::normalize).
///
/// Every variant is fatal for a run: callers must not submit anything
/// after receiving one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The normalizer configuration is unusable.
    #[error("invalid normalizer config: {0}")]
    InvalidConfig(String),

    /// A holding weight lies outside `[0, 1]`.
    #[error("weight for {ticker} ({weight}) is outside [0, 1]")]
    InvalidWeight { ticker: String, weight: Decimal },

    /// The kept holdings sum to zero, so there is nothing to scale.
    #[error("matched holdings sum to zero; cannot renormalize")]
    ZeroWeightSum,

    /// Rounding moved the sum further than one unit of precision.
    #[error("rounding drift {shift} exceeds tolerance {tolerance}")]
    DriftExceeded { shift: Decimal, tolerance: Decimal },

    /// The corrected weights do not add up to one.
    #[error("corrected weights sum to {0}, expected exactly 1")]
    SumMismatch(Decimal),

    /// A matched ticker could not be mapped back to a single instrument.
    #[error("cannot resolve {ticker}: {reason}")]
    Unresolved { ticker: String, reason: Resolution },
}

/// Why a base symbol did not resolve to exactly one tradable id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Resolution {
    #[error("no tradable instrument")]
    Missing,

    #[error("ambiguous between {}", .0.join(", "))]
    Ambiguous(Vec<String>),
}

/// Errors from a [`CacheRepository`](crate::cache::CacheRepository).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a [`Selector`](crate::select::Selector).
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("selection cancelled")]
    Cancelled,

    #[error("selection prompt failed: {0}")]
    Prompt(String),
}
