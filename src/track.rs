//! Tracks and the per-observation states that make up their history.

use std::collections::VecDeque;

use crate::attributes::{AssocVariant, StateAttributes};
use crate::config::TrackerConfig;
use crate::geometry::Rect;
use crate::histogram::AppearanceHistogram;
use crate::motion::MotionFilter;
use crate::timestamp::Timestamp;

/// Why a track was terminated, carried as a diagnostic attribute on the
/// track so downstream sinks can filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    Coast,
    Aoi,
    Divergence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Provisional,
    Active,
    Coasting,
    Terminated,
}

/// One observation appended to a track's history. Immutable once created.
#[derive(Debug, Clone)]
pub struct TrackState {
    pub timestamp: Timestamp,
    pub location: (f64, f64),
    pub velocity: (f64, f64),
    pub image_location: Option<(f64, f64)>,
    pub world_location: Option<(f64, f64, f64)>,
    pub bounding_box: Option<Rect>,
    pub location_covariance: [[f64; 2]; 2],
    pub attributes: StateAttributes,
    /// Calibrated confidence, populated from the cost model's kinematic
    /// likelihood when multi-feature mode is active; `None` otherwise.
    pub track_confidence: Option<f32>,
}

/// Rolling appearance cache: the most recently observed histogram, used by
/// the cost model as "the track's histogram" for similarity comparisons.
#[derive(Debug, Clone)]
pub struct AppearanceCache {
    histogram: AppearanceHistogram,
}

impl AppearanceCache {
    pub fn empty() -> Self {
        Self {
            histogram: AppearanceHistogram::empty(),
        }
    }

    pub fn histogram(&self) -> &AppearanceHistogram {
        &self.histogram
    }

    pub fn refresh(&mut self, histogram: &AppearanceHistogram) {
        self.histogram = histogram.clone();
    }
}

#[derive(Debug, Clone)]
struct AreaSample {
    area: f64,
}

/// One live or terminated target.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub history: Vec<TrackState>,
    pub motion_filter: MotionFilter,
    pub appearance_cache: AppearanceCache,
    pub status: TrackStatus,
    pub missed_frames: u32,
    pub observed_frames: u32,
    pub termination_cause: Option<TerminationCause>,
    birth_frame: u64,
    area_samples: VecDeque<AreaSample>,
    area_window: u32,
    area_decay: f64,
}

impl Track {
    pub(crate) fn new(
        id: u64,
        birth_frame: u64,
        initial_state: TrackState,
        motion_filter: MotionFilter,
        config: &TrackerConfig,
    ) -> Self {
        let mut area_samples = VecDeque::new();
        if let Some(rect) = initial_state.bounding_box {
            let area = rect.area() as f64;
            if area > 0.0 {
                area_samples.push_back(AreaSample { area });
            }
        }
        Self {
            id,
            history: vec![initial_state],
            motion_filter,
            appearance_cache: AppearanceCache::empty(),
            status: TrackStatus::Provisional,
            missed_frames: 0,
            observed_frames: 1,
            termination_cause: None,
            birth_frame,
            area_samples,
            area_window: config.area_window,
            area_decay: config.area_decay,
        }
    }

    pub fn last_state(&self) -> &TrackState {
        self.history
            .last()
            .expect("track history is never empty while live")
    }

    pub fn last_timestamp(&self) -> Timestamp {
        self.last_state().timestamp
    }

    pub(crate) fn frames_since_birth(&self, current_frame: u64) -> u64 {
        current_frame - self.birth_frame + 1
    }

    /// Decayed mean over the last `area_window` observations, weights
    /// `(1-decay)^k` for the k-th most recent sample, normalized — following
    /// `tracker_cost_func_color_size_kin_amhi.cxx`'s `set()`: the running
    /// weight is multiplied by `(1 - decay)` *before* each term is
    /// accumulated, so the most recent sample's weight is `(1 - decay)`, not
    /// `1`.
    pub fn area_ema(&self) -> f64 {
        let mut total_weight = 0.0;
        let mut weighted_sum = 0.0;
        let mut curr_weight = 1.0;
        for sample in self
            .area_samples
            .iter()
            .rev()
            .take(self.area_window as usize)
        {
            curr_weight *= 1.0 - self.area_decay;
            weighted_sum += sample.area * curr_weight;
            total_weight += curr_weight;
        }
        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        }
    }

    pub(crate) fn record_area(&mut self, area: Option<f64>) {
        if let Some(area) = area {
            if area > 0.0 {
                self.area_samples.push_back(AreaSample { area });
                while self.area_samples.len() > self.area_window as usize {
                    self.area_samples.pop_front();
                }
            }
        }
    }

    pub(crate) fn push_state(&mut self, state: TrackState) {
        self.history.push(state);
    }

    pub fn covariance_trace(&self) -> f64 {
        self.motion_filter.covariance_trace()
    }

    pub(crate) fn last_assoc_variant(&self) -> AssocVariant {
        self.last_state().attributes.assoc
    }
}
