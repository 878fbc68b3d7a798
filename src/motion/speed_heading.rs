//! Extended Kalman filter over `[x, y, speed, heading]`, grounded on
//! `original_source/library/tracking/extended_kalman_functions.cxx`'s
//! `speed_heading_fun`.

use ndarray::{Array1, Array2};

use super::{invert_2x2, symmetrize};
use crate::error::Degeneracy;

const INITIAL_POSITION_VARIANCE: f64 = 1.0;
const INITIAL_SPEED_VARIANCE: f64 = 1.0;
const INITIAL_HEADING_VARIANCE: f64 = 1.0;
const DEFAULT_HEADING: f64 = std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct SpeedHeadingFilter {
    mean: Array1<f64>,
    covariance: Array2<f64>,
    process_noise: Array2<f64>,
}

impl SpeedHeadingFilter {
    /// `Lifecycle::birth` only ever has a single seed detection to work
    /// with (a `Provisional` track is created immediately on the first
    /// unassigned detection, before any further observation exists), so
    /// there is never a direction or instantaneous speed to derive here:
    /// every track is born with heading `pi/2` and speed `0`. Speed and
    /// heading then converge to the track's real motion through ordinary
    /// Kalman updates as subsequent detections associate, the same way any
    /// other EKF state component is learned from measurements rather than
    /// seeded from history.
    pub fn new(measurement: (f64, f64), process_noise: &Array2<f64>) -> Self {
        let (heading, speed) = (DEFAULT_HEADING, 0.0);
        let mean = Array1::from_vec(vec![measurement.0, measurement.1, speed, heading]);
        let mut covariance = Array2::zeros((4, 4));
        covariance[[0, 0]] = INITIAL_POSITION_VARIANCE;
        covariance[[1, 1]] = INITIAL_POSITION_VARIANCE;
        covariance[[2, 2]] = INITIAL_SPEED_VARIANCE;
        covariance[[3, 3]] = INITIAL_HEADING_VARIANCE;
        Self {
            mean,
            covariance,
            process_noise: process_noise.clone(),
        }
    }

    fn transition(mean: &Array1<f64>, dt: f64) -> Array1<f64> {
        let (s, theta) = (mean[2], mean[3]);
        Array1::from_vec(vec![
            mean[0] + dt * s * theta.cos(),
            mean[1] + dt * s * theta.sin(),
            s,
            theta,
        ])
    }

    /// Jacobian of the transition with respect to state, evaluated at the
    /// *current* posterior (before advancing).
    fn jacobian(mean: &Array1<f64>, dt: f64) -> Array2<f64> {
        let (s, theta) = (mean[2], mean[3]);
        let cos_t = theta.cos();
        let sin_t = theta.sin();
        let mut j = Array2::eye(4);
        j[[0, 2]] = dt * cos_t;
        j[[0, 3]] = -dt * s * sin_t;
        j[[1, 2]] = dt * sin_t;
        j[[1, 3]] = dt * s * cos_t;
        j
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
        let f = Self::jacobian(&self.mean, dt);
        let mean = Self::transition(&self.mean, dt);
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
        let (s, theta) = (self.mean[2], self.mean[3]);
        (s * theta.cos(), s * theta.sin())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_always_seeds_the_default_heading_and_zero_speed() {
        let q = Array2::zeros((4, 4));
        let f = SpeedHeadingFilter::new((3.0, 3.0), &q);
        assert_eq!(f.mean[3], DEFAULT_HEADING);
        assert_eq!(f.mean[2], 0.0);
    }

    #[test]
    fn zero_speed_means_predict_does_not_move_the_track() {
        let q = Array2::zeros((4, 4));
        let f = SpeedHeadingFilter::new((0.0, 0.0), &q);
        let (mean, _) = f.predict(1.0);
        assert_eq!(mean[0], 0.0);
        assert_eq!(mean[1], 0.0);
    }

    #[test]
    fn perfect_observation_idempotence() {
        // Same Kalman-update sanity check as the linear filter: the default
        // seed carries no real motion information, but the *update* path
        // still converges exactly onto a noise-free measurement at the
        // predicted location, which is how real heading/speed get learned
        // from subsequent detections once a track is alive.
        let q = Array2::zeros((4, 4));
        let r = Array2::zeros((2, 2));
        let mut f = SpeedHeadingFilter::new((0.0, 0.0), &q);
        let (pred_mean, _) = f.predict(1.0);
        f.update((pred_mean[0], pred_mean[1]), &r, 1.0);
        let (loc_x, loc_y) = f.current_location();
        assert!((loc_x - pred_mean[0]).abs() < 1e-9);
        assert!((loc_y - pred_mean[1]).abs() < 1e-9);
    }
}
