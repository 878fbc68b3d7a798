//! Per-track motion state estimation: predict/update over two interchangeable
//! variants, chosen once per track at birth and dispatched through a tagged
//! enum rather than a trait-object hierarchy (spec Design Notes §9).

mod linear;
mod speed_heading;

pub use linear::LinearFilter;
pub use speed_heading::SpeedHeadingFilter;

use ndarray::{Array1, Array2};

use crate::attributes::FilterVariant;
use crate::config::MotionModel;

/// A predicted or posterior `(x, y)` mean with its 2x2 location covariance,
/// the common projection every cost computation needs regardless of which
/// filter variant produced it.
#[derive(Debug, Clone, Copy)]
pub struct LocationEstimate {
    pub location: (f64, f64),
    pub covariance: [[f64; 2]; 2],
}

/// A single track's motion estimator. Exactly one variant is chosen at
/// track birth (`MotionFilter::new`) and never changes for the track's
/// lifetime.
#[derive(Debug, Clone)]
pub enum MotionFilter {
    Linear(LinearFilter),
    SpeedHeading(SpeedHeadingFilter),
}

impl MotionFilter {
    /// Initialize a filter of the configured variant from a track's first
    /// measurement. `SpeedHeading` always seeds heading/speed at their
    /// default (see [`SpeedHeadingFilter::new`]); there is never more than
    /// one detection on hand at birth to derive anything richer from.
    pub fn new(model: MotionModel, measurement: (f64, f64), process_noise: &Array2<f64>) -> Self {
        match model {
            MotionModel::Linear => MotionFilter::Linear(LinearFilter::new(measurement, process_noise)),
            MotionModel::SpeedHeading => MotionFilter::SpeedHeading(SpeedHeadingFilter::new(measurement, process_noise)),
        }
    }

    pub fn variant(&self) -> FilterVariant {
        match self {
            MotionFilter::Linear(_) => FilterVariant::Linear,
            MotionFilter::SpeedHeading(_) => FilterVariant::SpeedHeading,
        }
    }

    /// Predict `dt` seconds forward without mutating internal state. Used by
    /// the cost model and for read-only coast display. `dt == 0` returns the
    /// current posterior unchanged.
    pub fn predict(&self, dt: f64) -> (Array1<f64>, Array2<f64>) {
        match self {
            MotionFilter::Linear(f) => f.predict(dt),
            MotionFilter::SpeedHeading(f) => f.predict(dt),
        }
    }

    /// Advance the internal posterior to `dt` seconds forward, in place,
    /// with no measurement (used when the coast policy advances state).
    pub fn advance(&mut self, dt: f64) {
        match self {
            MotionFilter::Linear(f) => f.advance(dt),
            MotionFilter::SpeedHeading(f) => f.advance(dt),
        }
    }

    /// Predict to `now + dt`, then apply the measurement `z` with noise `R`.
    /// On completion the posterior covariance is re-symmetrized.
    pub fn update(&mut self, z: (f64, f64), r: &Array2<f64>, dt: f64) {
        match self {
            MotionFilter::Linear(f) => f.update(z, r, dt),
            MotionFilter::SpeedHeading(f) => f.update(z, r, dt),
        }
    }

    pub fn current_location(&self) -> (f64, f64) {
        match self {
            MotionFilter::Linear(f) => f.current_location(),
            MotionFilter::SpeedHeading(f) => f.current_location(),
        }
    }

    pub fn current_velocity(&self) -> (f64, f64) {
        match self {
            MotionFilter::Linear(f) => f.current_velocity(),
            MotionFilter::SpeedHeading(f) => f.current_velocity(),
        }
    }

    pub fn current_location_covariance(&self) -> [[f64; 2]; 2] {
        match self {
            MotionFilter::Linear(f) => f.current_location_covariance(),
            MotionFilter::SpeedHeading(f) => f.current_location_covariance(),
        }
    }

    /// Trace of the full posterior covariance, used for the divergence test.
    pub fn covariance_trace(&self) -> f64 {
        match self {
            MotionFilter::Linear(f) => f.covariance_trace(),
            MotionFilter::SpeedHeading(f) => f.covariance_trace(),
        }
    }

    /// Read `(vx, vy)` off of a raw `mean` vector produced by this filter's
    /// own `predict`, without committing it as the posterior. Used when
    /// displaying a coasting track's predicted state without advancing the
    /// filter in place (`TrackerConfig::coast_advances_state == false`).
    pub(crate) fn velocity_from_mean(&self, mean: &Array1<f64>) -> (f64, f64) {
        match self {
            MotionFilter::Linear(_) => (mean[2], mean[3]),
            MotionFilter::SpeedHeading(_) => {
                let (s, theta) = (mean[2], mean[3]);
                (s * theta.cos(), s * theta.sin())
            }
        }
    }

    /// Project a `(mean, covariance)` pair (e.g. from `predict`) down to its
    /// `(x, y)` location estimate. Both variants observe `(x, y)` directly as
    /// the first two state components.
    pub fn to_location_estimate(mean: &Array1<f64>, covariance: &Array2<f64>) -> LocationEstimate {
        LocationEstimate {
            location: (mean[0], mean[1]),
            covariance: [
                [covariance[[0, 0]], covariance[[0, 1]]],
                [covariance[[1, 0]], covariance[[1, 1]]],
            ],
        }
    }
}

/// Re-symmetrize a covariance matrix as `(P + Pᵀ) / 2`, enforcing the
/// numerical-symmetry invariant on every filter exit.
pub(crate) fn symmetrize(p: &Array2<f64>) -> Array2<f64> {
    (p + &p.t()) / 2.0
}

/// Invert a 2x2 matrix using nalgebra. Returns `None` if the matrix is
/// (numerically) singular.
pub(crate) fn invert_2x2(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix2::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((2, 2));
    for i in 0..2 {
        for j in 0..2 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}
