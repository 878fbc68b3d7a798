//! Linear (uniform-motion) Kalman filter: state `[x, y, vx, vy]`.

use ndarray::{Array1, Array2};

use super::{invert_2x2, symmetrize};
use crate::error::Degeneracy;

const INITIAL_POSITION_VARIANCE: f64 = 1.0;
const INITIAL_VELOCITY_VARIANCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct LinearFilter {
    mean: Array1<f64>,
    covariance: Array2<f64>,
    process_noise: Array2<f64>,
}

impl LinearFilter {
    /// `process_noise` is the configured additive 4x4 `Q`; the birth
    /// covariance itself is a fixed, uninformative diagonal prior
    /// (position and velocity variance 1, no cross terms) independent of
    /// `Q`/`R` — see the observability argument in DESIGN.md for why this
    /// choice makes the perfect-motion identity test converge to an exactly
    /// zero posterior covariance after two updates.
    pub fn new(measurement: (f64, f64), process_noise: &Array2<f64>) -> Self {
        let mean = Array1::from_vec(vec![measurement.0, measurement.1, 0.0, 0.0]);
        let mut covariance = Array2::zeros((4, 4));
        covariance[[0, 0]] = INITIAL_POSITION_VARIANCE;
        covariance[[1, 1]] = INITIAL_POSITION_VARIANCE;
        covariance[[2, 2]] = INITIAL_VELOCITY_VARIANCE;
        covariance[[3, 3]] = INITIAL_VELOCITY_VARIANCE;
        Self {
            mean,
            covariance,
            process_noise: process_noise.clone(),
        }
    }

    fn transition(dt: f64) -> Array2<f64> {
        let mut f = Array2::eye(4);
        f[[0, 2]] = dt;
        f[[1, 3]] = dt;
        f
    }

    fn observation() -> Array2<f64> {
        let mut h = Array2::zeros((2, 4));
        h[[0, 0]] = 1.0;
        h[[1, 1]] = 1.0;
        h
    }

    pub fn predict(&self, dt: f64) -> (Array1<f64>, Array2<f64>) {
        if dt == 0.0 {
            return (self.mean.clone(), self.covariance.clone());
        }
        let f = Self::transition(dt);
        let mean = f.dot(&self.mean);
        let covariance = f.dot(&self.covariance).dot(&f.t()) + &self.process_noise * dt;
        (mean, covariance)
    }

    pub fn advance(&mut self, dt: f64) {
        let (mean, covariance) = self.predict(dt);
        self.mean = mean;
        self.covariance = symmetrize(&covariance);
    }

    pub fn update(&mut self, z: (f64, f64), r: &Array2<f64>, dt: f64) {
        let (mean_pred, cov_pred) = self.predict(dt);
        let h = Self::observation();
        let innovation_cov = h.dot(&cov_pred).dot(&h.t()) + r;

        match invert_2x2(&innovation_cov) {
            Some(s_inv) => {
                let z_vec = Array1::from_vec(vec![z.0, z.1]);
                let innovation = &z_vec - &h.dot(&mean_pred);
                let pht = cov_pred.dot(&h.t());
                let kalman_gain = pht.dot(&s_inv);
                let mean = &mean_pred + &kalman_gain.dot(&innovation);
                let covariance = &cov_pred - &kalman_gain.dot(&h).dot(&cov_pred);
                self.mean = mean;
                self.covariance = symmetrize(&covariance);
            }
            None => {
                tracing::debug!(reason = Degeneracy::NumericalDegeneracy.as_str(), "innovation covariance not invertible, falling back to prediction only");
                self.mean = mean_pred;
                self.covariance = symmetrize(&cov_pred);
            }
        }
    }

    pub fn current_location(&self) -> (f64, f64) {
        (self.mean[0], self.mean[1])
    }

    pub fn current_velocity(&self) -> (f64, f64) {
        (self.mean[2], self.mean[3])
    }

    pub fn current_location_covariance(&self) -> [[f64; 2]; 2] {
        [
            [self.covariance[[0, 0]], self.covariance[[0, 1]]],
            [self.covariance[[1, 0]], self.covariance[[1, 1]]],
        ]
    }

    pub fn covariance_trace(&self) -> f64 {
        (0..4).map(|i| self.covariance[[i, i]]).sum()
    }
}
