//! Error taxonomy for the tracker core.
//!
//! Only [`TrackerError::Configuration`] and [`TrackerError::ContractViolation`]
//! ever leave the crate as a `Result::Err`. Numerical degeneracy and filter
//! divergence are recovered internally (a gated cost, or a terminated track
//! carrying a diagnostic cause); an assigner timeout falls back to a greedy
//! assignment. Those three are only ever observed through `tracing` events.

use thiserror::Error;

/// Errors surfaced across the tracker's public boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    /// An option value or cross-field invariant in [`crate::config::TrackerConfig`]
    /// is invalid. Raised only at load time, never during `step`.
    #[error("invalid tracker configuration: {0}")]
    Configuration(String),

    /// The caller violated the `step` contract: a non-monotonic timestamp, or
    /// a detection with non-finite coordinates. The frame is rejected and the
    /// registry is left untouched.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// Internal, non-surfaced degeneracy conditions. Kept as a type so that
/// `tracing` events carry a structured `reason` rather than an ad-hoc string,
/// even though nothing downstream of this crate ever sees the enum itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Degeneracy {
    /// A per-pair innovation covariance could not be inverted or had a
    /// non-finite determinant; the pair was gated out.
    NumericalDegeneracy,
    /// A track's posterior covariance trace exceeded the configured cap.
    FilterDivergence,
    /// The matching step exceeded its time budget and fell back to greedy
    /// assignment.
    AssignerTimeout,
}

impl Degeneracy {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Degeneracy::NumericalDegeneracy => "numerical_degeneracy",
            Degeneracy::FilterDivergence => "filter_divergence",
            Degeneracy::AssignerTimeout => "assigner_timeout",
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
