//! Tracker configuration: motion model, noise matrices, gating and cost
//! weights, birth/coast/termination thresholds, plus the ambient keys that
//! drive the assigner's time-budget fallback and the coast policy's
//! state-advance switch.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::geometry::Aoi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionModel {
    Linear,
    SpeedHeading,
}

impl Default for MotionModel {
    fn default() -> Self {
        MotionModel::Linear
    }
}

/// Multi-feature cost weights; must sum to 1 (within tolerance) when
/// `multi_feature` is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub w_kin: f64,
    pub w_col: f64,
    pub w_area: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w_kin: 0.6,
            w_col: 0.2,
            w_area: 0.2,
        }
    }
}

/// N-of-M birth confirmation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthConfig {
    pub n: u32,
    pub m: u32,
}

impl Default for BirthConfig {
    fn default() -> Self {
        Self { n: 3, m: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub motion_model: MotionModel,
    /// Additive 4x4 process noise `Q`, row-major.
    pub process_noise: [[f64; 4]; 4],
    /// Additive 2x2 measurement noise `R`, row-major.
    pub measurement_noise: [[f64; 2]; 2],
    pub gate_sigma_sqr: f64,
    pub multi_feature: bool,
    pub weights: Weights,
    pub min_color_similarity: f64,
    pub min_area_similarity: f64,
    pub area_window: u32,
    pub area_decay: f64,
    pub birth: BirthConfig,
    pub coast_limit: u32,
    pub divergence_trace_cap: f64,
    pub aoi: Option<Aoi>,
    /// Time budget, in microseconds, for the per-frame matching step before
    /// it falls back to greedy assignment. The exact solve runs on a worker
    /// thread so this genuinely bounds how long `step` waits on it rather
    /// than just logging after the fact; keep it generous enough to clear
    /// ordinary thread-spawn latency. `0` disables the budget (always solve
    /// exactly, on the calling thread).
    pub assigner_timeout_micros: u64,
    /// Whether a coasting track's motion filter advances its internal
    /// posterior in place each frame it goes unassigned, or keeps a copy of
    /// the last posterior while only the appended `TrackState` carries the
    /// predicted location.
    pub coast_advances_state: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            motion_model: MotionModel::default(),
            process_noise: [
                [0.05, 0.0, 0.0, 0.0],
                [0.0, 0.05, 0.0, 0.0],
                [0.0, 0.0, 0.01, 0.0],
                [0.0, 0.0, 0.0, 0.01],
            ],
            measurement_noise: [[1.0, 0.0], [0.0, 1.0]],
            gate_sigma_sqr: 9.21, // chi-square, 2 DOF, p = 0.99
            multi_feature: false,
            weights: Weights::default(),
            min_color_similarity: 0.5,
            min_area_similarity: 0.3,
            area_window: 5,
            area_decay: 0.3,
            birth: BirthConfig::default(),
            coast_limit: 5,
            divergence_trace_cap: 1.0e6,
            aoi: None,
            assigner_timeout_micros: 20_000,
            coast_advances_state: true,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gate_sigma_sqr <= 0.0 {
            return Err(TrackerError::Configuration(
                "gate_sigma_sqr must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_color_similarity) {
            return Err(TrackerError::Configuration(
                "min_color_similarity must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_area_similarity) {
            return Err(TrackerError::Configuration(
                "min_area_similarity must be in [0, 1]".into(),
            ));
        }
        if self.area_window < 1 {
            return Err(TrackerError::Configuration(
                "area_window must be >= 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.area_decay) || self.area_decay <= 0.0 {
            return Err(TrackerError::Configuration(
                "area_decay must be in (0, 1)".into(),
            ));
        }
        if self.birth.n < 1 || self.birth.n > self.birth.m {
            return Err(TrackerError::Configuration(
                "birth config must satisfy 1 <= N <= M".into(),
            ));
        }
        if self.divergence_trace_cap <= 0.0 {
            return Err(TrackerError::Configuration(
                "divergence_trace_cap must be > 0".into(),
            ));
        }
        if self.multi_feature {
            let sum = self.weights.w_kin + self.weights.w_col + self.weights.w_area;
            if (sum - 1.0).abs() > 1e-6 {
                return Err(TrackerError::Configuration(format!(
                    "multi_feature weights must sum to 1, got {sum}"
                )));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| TrackerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| TrackerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn process_noise_matrix(&self) -> Array2<f64> {
        let mut m = Array2::zeros((4, 4));
        for i in 0..4 {
            for j in 0..4 {
                m[[i, j]] = self.process_noise[i][j];
            }
        }
        m
    }

    pub(crate) fn measurement_noise_matrix(&self) -> Array2<f64> {
        let mut m = Array2::zeros((2, 2));
        for i in 0..2 {
            for j in 0..2 {
                m[[i, j]] = self.measurement_noise[i][j];
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TrackerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_gate() {
        let mut c = TrackerConfig::default();
        c.gate_sigma_sqr = 0.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_bad_birth_window() {
        let mut c = TrackerConfig::default();
        c.birth = BirthConfig { n: 4, m: 3 };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut c = TrackerConfig::default();
        c.multi_feature = true;
        c.weights = Weights {
            w_kin: 0.5,
            w_col: 0.5,
            w_area: 0.5,
        };
        assert!(c.validate().is_err());
    }
}
