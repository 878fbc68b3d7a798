//! The top-level `Tracker`: wires `TrackRegistry`, `CostModel`, `Assigner`,
//! `TrackUpdater`, and `Lifecycle` into the per-frame pipeline described in
//! the system overview — predict (implicit in cost), cost, assign, update,
//! lifecycle.

use ndarray::Array2;

use crate::assign::Assigner;
use crate::config::TrackerConfig;
use crate::cost::CostModel;
use crate::detection::Detection;
use crate::error::{Result, TrackerError};
use crate::geometry::apply_plane_to_world;
use crate::lifecycle::Lifecycle;
use crate::registry::TrackRegistry;
use crate::timestamp::Timestamp;
use crate::track::{Track, TrackStatus};
use crate::updater::TrackUpdater;

/// An optional 3x3 projective transform from the stabilized plane to a
/// world frame, row-major. Passed alongside each frame's detections to
/// enrich coasting tracks' states with `world_location`.
pub type PlaneToWorld = [[f64; 3]; 3];

pub struct Tracker {
    config: TrackerConfig,
    registry: TrackRegistry,
    last_timestamp: Option<Timestamp>,
    terminated: Vec<Track>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: TrackRegistry::new(),
            last_timestamp: None,
            terminated: Vec::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Run one frame: predict every live track to `timestamp`, score it
    /// against `detections`, solve the assignment, apply updates/coasts,
    /// then birth and retire tracks. Rejects the frame outright (without
    /// mutating the registry) on a non-monotonic `timestamp` or a
    /// detection carrying a non-finite coordinate.
    pub fn step(
        &mut self,
        timestamp: Timestamp,
        detections: &[Detection],
        plane_to_world: Option<PlaneToWorld>,
    ) -> Result<()> {
        if let Some(last) = self.last_timestamp {
            if !timestamp.is_monotonic_after(&last) {
                return Err(TrackerError::ContractViolation(format!(
                    "timestamp frame {} / {}s is not monotonic after frame {} / {}s",
                    timestamp.frame_number, timestamp.seconds, last.frame_number, last.seconds
                )));
            }
        }
        if let Some(bad) = detections.iter().position(Detection::has_non_finite_coordinates) {
            return Err(TrackerError::ContractViolation(format!(
                "detection {bad} has a non-finite coordinate"
            )));
        }

        let span = tracing::info_span!("tracker_step", frame = timestamp.frame_number, live = self.registry.len());
        let _enter = span.enter();

        let ids = self.registry.live_ids();
        let mut cost_matrix = Array2::from_elem((ids.len(), detections.len()), f64::INFINITY);
        let mut confidences: Vec<Vec<Option<f32>>> = vec![vec![None; detections.len()]; ids.len()];
        for (row, &id) in ids.iter().enumerate() {
            let track = self.registry.get(id).expect("id came from live_ids");
            for (col, detection) in detections.iter().enumerate() {
                let result = CostModel::cost(track, detection, timestamp, &self.config);
                cost_matrix[[row, col]] = result.cost;
                confidences[row][col] = result.track_confidence;
            }
        }

        let assignment = Assigner::assign(&cost_matrix, &self.config);
        if assignment.used_fallback {
            tracing::debug!(frame = timestamp.frame_number, "frame matched via greedy fallback");
        }

        for &(row, col) in &assignment.matches {
            let id = ids[row];
            let confidence = confidences[row][col];
            let track = self.registry.get_mut(id).expect("id came from live_ids");
            TrackUpdater::apply_match(track, &detections[col], timestamp, confidence, &self.config);
        }

        for &row in &assignment.unmatched_tracks {
            let id = ids[row];
            let track = self.registry.get_mut(id).expect("id came from live_ids");
            TrackUpdater::apply_unassigned(track, timestamp, &self.config);
            if let Some(transform) = plane_to_world {
                if let Some(state) = track.history.last_mut() {
                    if state.world_location.is_none() {
                        state.world_location = Some(apply_plane_to_world(&transform, state.location));
                    }
                }
            }
        }

        for &col in &assignment.unmatched_detections {
            Lifecycle::birth(&mut self.registry, &detections[col], timestamp, timestamp.frame_number, &self.config);
        }

        for id in self.registry.live_ids() {
            if Lifecycle::evaluate_confirmation(&mut self.registry, id, timestamp.frame_number, &self.config) {
                continue;
            }
            if let Some(track) = Lifecycle::evaluate_termination(&mut self.registry, id, &self.config) {
                self.terminated.push(track);
            }
        }

        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    /// Read-only snapshot of every live, non-provisional track, valid until
    /// the next call to `step`.
    pub fn active_tracks(&self) -> Vec<&Track> {
        self.registry
            .live_ids()
            .into_iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|t| matches!(t.status, TrackStatus::Active | TrackStatus::Coasting))
            .collect()
    }

    /// Drain and return every track finalized (confirmed-terminated) since
    /// the last call. The core does not retain them past this call.
    pub fn terminated_tracks(&mut self) -> Vec<Track> {
        std::mem::take(&mut self.terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn detection_at(x: f64, y: f64) -> Detection {
        Detection::new((x, y), (x, y, 0.0), Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn rejects_non_monotonic_timestamp_without_mutating_registry() {
        let mut config = TrackerConfig::default();
        config.birth.n = 1;
        let mut tracker = Tracker::new(config).unwrap();
        tracker.step(Timestamp::new(5, 5.0), &[detection_at(0.0, 0.0)], None).unwrap();
        let before = tracker.registry.len();
        let result = tracker.step(Timestamp::new(4, 4.0), &[detection_at(0.0, 0.0)], None);
        assert!(result.is_err());
        assert_eq!(tracker.registry.len(), before);
    }

    #[test]
    fn rejects_non_finite_detection() {
        let config = TrackerConfig::default();
        let mut tracker = Tracker::new(config).unwrap();
        let bad = Detection::new((f64::NAN, 0.0), (0.0, 0.0, 0.0), Rect::new(0.0, 0.0, 1.0, 1.0));
        let result = tracker.step(Timestamp::new(0, 0.0), &[bad], None);
        assert!(result.is_err());
        assert!(tracker.registry.is_empty());
    }

    #[test]
    fn single_clean_detection_confirms_after_n_frames() {
        let mut config = TrackerConfig::default();
        config.birth.n = 2;
        config.birth.m = 3;
        let mut tracker = Tracker::new(config).unwrap();
        for frame in 0..3u64 {
            let t = frame as f64;
            tracker
                .step(Timestamp::new(frame, t), &[detection_at(t, 2.0 * t)], None)
                .unwrap();
        }
        assert_eq!(tracker.active_tracks().len(), 1);
    }

    #[test]
    fn unmatched_detections_do_not_immediately_appear_as_active() {
        let config = TrackerConfig::default();
        let mut tracker = Tracker::new(config).unwrap();
        tracker.step(Timestamp::new(0, 0.0), &[detection_at(0.0, 0.0)], None).unwrap();
        assert!(tracker.active_tracks().is_empty());
    }
}
