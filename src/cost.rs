//! Gated, multi-feature cost between a (predicted) track and a detection.
//!
//! Grounded directly on
//! `original_source/library/tracking/tracker_cost_func_color_size_kin_amhi.cxx`:
//! the gate test, the three similarity terms, and the `-log(similarity)`
//! aggregation follow that file's `cost()`/`tcfcska_calculate_probs()`
//! almost line for line, generalized from vnl/vxl types to `ndarray`/`f64`.

use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::motion::MotionFilter;
use crate::timestamp::Timestamp;
use crate::track::Track;

/// Outcome of scoring a single `(track, detection)` pair.
#[derive(Debug, Clone, Copy)]
pub struct CostResult {
    /// `+inf` means gated out; never assigned.
    pub cost: f64,
    /// Populated from the kinematic likelihood when multi-feature mode is
    /// active; `None` in kinematic-only mode.
    pub track_confidence: Option<f32>,
}

impl CostResult {
    fn gated() -> Self {
        Self {
            cost: f64::INFINITY,
            track_confidence: None,
        }
    }
}

pub struct CostModel;

impl CostModel {
    pub fn cost(track: &Track, detection: &Detection, now: Timestamp, config: &TrackerConfig) -> CostResult {
        let dt = now.diff_secs(&track.last_timestamp());
        let (mean, cov) = track.motion_filter.predict(dt);
        let estimate = MotionFilter::to_location_estimate(&mean, &cov);

        let r = config.measurement_noise;
        let sigma = [
            [estimate.covariance[0][0] + r[0][0], estimate.covariance[0][1] + r[0][1]],
            [estimate.covariance[1][0] + r[1][0], estimate.covariance[1][1] + r[1][1]],
        ];

        let det = sigma[0][0] * sigma[1][1] - sigma[0][1] * sigma[1][0];
        if det == 0.0 || !det.is_finite() {
            return CostResult::gated();
        }

        let (dx, dy, _dz) = detection.world_location;
        let (mx, my) = estimate.location;
        let delta = (dx - mx, dy - my);

        // Sigma^-1 via cofactor formula for a 2x2 matrix.
        let inv = [
            [sigma[1][1] / det, -sigma[0][1] / det],
            [-sigma[1][0] / det, sigma[0][0] / det],
        ];
        let m2 = delta.0 * (inv[0][0] * delta.0 + inv[0][1] * delta.1)
            + delta.1 * (inv[1][0] * delta.0 + inv[1][1] * delta.1);

        if !m2.is_finite() || m2 >= config.gate_sigma_sqr {
            return CostResult::gated();
        }

        if !config.multi_feature {
            return CostResult {
                cost: 0.5 * m2,
                track_confidence: None,
            };
        }

        let p_kin = (-0.5 * m2).exp();
        let p_col = color_similarity(track, detection, config.min_color_similarity);
        let p_area = area_similarity(track, detection, config.min_area_similarity);

        if p_col < 0.0 || p_area < 0.0 {
            return CostResult::gated();
        }

        let w = config.weights;
        let similarity = w.w_kin * p_kin + w.w_col * p_col + w.w_area * p_area;
        if similarity <= 0.0 || !similarity.is_finite() {
            return CostResult::gated();
        }

        CostResult {
            cost: -similarity.ln(),
            track_confidence: Some(p_kin as f32),
        }
    }
}

/// `0` if either side lacks a histogram or the track's cache is
/// uninitialized (`mass == 0`); `-0.1` (reject) if the similarity falls
/// below `min_color_similarity`; otherwise the similarity itself.
fn color_similarity(track: &Track, detection: &Detection, min_color_similarity: f64) -> f64 {
    let cache = track.appearance_cache.histogram();
    if cache.mass() == 0.0 {
        return 0.0;
    }
    let Some(det_hist) = &detection.appearance_histogram else {
        return 0.0;
    };
    let sim = cache.similarity(det_hist) as f64;
    if sim < min_color_similarity {
        -0.1
    } else {
        sim
    }
}

/// `0` if the detection area is missing or either side's area is
/// non-positive; `-0.1` (reject) below `min_area_similarity`; otherwise
/// `exp(-(max/min - 1))`.
fn area_similarity(track: &Track, detection: &Detection, min_area_similarity: f64) -> f64 {
    let Some(det_area) = detection.area else {
        return 0.0;
    };
    let track_area = track.area_ema();
    if track_area <= 0.0 || det_area <= 0.0 {
        return 0.0;
    }
    let ratio = track_area.max(det_area) / track_area.min(det_area) - 1.0;
    let sim = (-ratio).exp();
    if sim < min_area_similarity {
        -0.1
    } else {
        sim
    }
}
