//! Applies one frame's assignment outcome to the tracks it touches: a
//! Kalman update for matched pairs, a coast step for unassigned tracks,
//! and the appearance/area cache refresh the next frame's cost needs.

use crate::attributes::{AssocVariant, StateAttributes};
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::motion::MotionFilter;
use crate::timestamp::Timestamp;
use crate::track::{Track, TrackState, TrackStatus};

pub struct TrackUpdater;

impl TrackUpdater {
    /// Apply a matched detection to `track`: Kalman-update the motion
    /// filter, refresh the appearance/area caches, and append the
    /// resulting [`TrackState`]. A track coasting before this match returns
    /// to `Active`; a `Provisional` track's promotion is decided separately
    /// by the lifecycle component once its confirmation window is known.
    pub fn apply_match(
        track: &mut Track,
        detection: &Detection,
        now: Timestamp,
        track_confidence: Option<f32>,
        config: &TrackerConfig,
    ) {
        let dt = now.diff_secs(&track.last_timestamp());
        let r = config.measurement_noise_matrix();
        let z = (detection.world_location.0, detection.world_location.1);
        track.motion_filter.update(z, &r, dt);

        if let Some(histogram) = &detection.appearance_histogram {
            track.appearance_cache.refresh(histogram);
        }
        let area = detection.area.or(Some(detection.bounding_box.area() as f64));
        track.record_area(area);

        let assoc = if config.multi_feature {
            AssocVariant::MultiFeatures
        } else {
            AssocVariant::Kinematic
        };
        let state = TrackState {
            timestamp: now,
            location: track.motion_filter.current_location(),
            velocity: track.motion_filter.current_velocity(),
            image_location: Some(detection.image_location),
            world_location: Some(detection.world_location),
            bounding_box: Some(detection.bounding_box),
            location_covariance: track.motion_filter.current_location_covariance(),
            attributes: StateAttributes::new(assoc, track.motion_filter.variant()),
            track_confidence,
        };
        track.push_state(state);
        track.missed_frames = 0;
        track.observed_frames += 1;
        if track.status == TrackStatus::Coasting {
            track.status = TrackStatus::Active;
        }
    }

    /// Coast a track that received no detection this frame: predict its
    /// location forward, optionally committing that prediction as the new
    /// posterior (`config.coast_advances_state`), and append the resulting
    /// `TrackState` with an inflated, no-measurement covariance.
    pub fn apply_unassigned(track: &mut Track, now: Timestamp, config: &TrackerConfig) {
        let dt = now.diff_secs(&track.last_timestamp());
        let (mean, covariance) = track.motion_filter.predict(dt);
        let estimate = MotionFilter::to_location_estimate(&mean, &covariance);
        let velocity = track.motion_filter.velocity_from_mean(&mean);

        if config.coast_advances_state {
            track.motion_filter.advance(dt);
        }

        let state = TrackState {
            timestamp: now,
            location: estimate.location,
            velocity,
            image_location: None,
            world_location: None,
            bounding_box: None,
            location_covariance: estimate.covariance,
            attributes: StateAttributes::new(track.last_assoc_variant(), track.motion_filter.variant()),
            track_confidence: None,
        };
        track.push_state(state);
        track.missed_frames += 1;
        if track.status == TrackStatus::Active {
            track.status = TrackStatus::Coasting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionModel;
    use crate::geometry::Rect;

    fn fresh_track() -> Track {
        let config = TrackerConfig::default();
        let filter = MotionFilter::new(MotionModel::Linear, (0.0, 0.0), &config.process_noise_matrix());
        let state = TrackState {
            timestamp: Timestamp::new(0, 0.0),
            location: (0.0, 0.0),
            velocity: (0.0, 0.0),
            image_location: Some((0.0, 0.0)),
            world_location: Some((0.0, 0.0, 0.0)),
            bounding_box: Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
            location_covariance: [[1.0, 0.0], [0.0, 1.0]],
            attributes: StateAttributes::new(AssocVariant::Kinematic, crate::attributes::FilterVariant::Linear),
            track_confidence: None,
        };
        Track::new(1, 0, state, filter, &config)
    }

    #[test]
    fn matched_update_resets_missed_frames_and_grows_history() {
        let mut track = fresh_track();
        let config = TrackerConfig::default();
        let det = Detection::new((1.0, 1.0), (1.0, 1.0, 0.0), Rect::new(0.0, 0.0, 10.0, 10.0));
        TrackUpdater::apply_match(&mut track, &det, Timestamp::new(1, 1.0), None, &config);
        assert_eq!(track.missed_frames, 0);
        assert_eq!(track.observed_frames, 2);
        assert_eq!(track.history.len(), 2);
    }

    #[test]
    fn coasting_from_active_flips_status_and_increments_missed() {
        let mut track = fresh_track();
        track.status = TrackStatus::Active;
        let config = TrackerConfig::default();
        TrackUpdater::apply_unassigned(&mut track, Timestamp::new(1, 1.0), &config);
        assert_eq!(track.status, TrackStatus::Coasting);
        assert_eq!(track.missed_frames, 1);
        assert!(track.history.last().unwrap().bounding_box.is_none());
    }

    #[test]
    fn rematch_after_coast_returns_to_active() {
        let mut track = fresh_track();
        track.status = TrackStatus::Active;
        let config = TrackerConfig::default();
        TrackUpdater::apply_unassigned(&mut track, Timestamp::new(1, 1.0), &config);
        let det = Detection::new((1.0, 1.0), (1.0, 1.0, 0.0), Rect::new(0.0, 0.0, 10.0, 10.0));
        TrackUpdater::apply_match(&mut track, &det, Timestamp::new(2, 2.0), None, &config);
        assert_eq!(track.status, TrackStatus::Active);
    }

    #[test]
    fn non_advancing_coast_leaves_filter_internal_state_frozen() {
        let mut track = fresh_track();
        let config = TrackerConfig::default();
        // establish nonzero velocity via a real match first.
        let det = Detection::new((1.0, 1.0), (1.0, 1.0, 0.0), Rect::new(0.0, 0.0, 10.0, 10.0));
        TrackUpdater::apply_match(&mut track, &det, Timestamp::new(1, 1.0), None, &config);
        let before = track.motion_filter.current_location();

        let mut frozen_config = config;
        frozen_config.coast_advances_state = false;
        TrackUpdater::apply_unassigned(&mut track, Timestamp::new(2, 2.0), &frozen_config);

        let after = track.motion_filter.current_location();
        assert_eq!(before, after, "filter internal state must not advance");
        // the appended state still carries the predicted (moved) location.
        assert_ne!(track.history.last().unwrap().location, after);
    }
}
