//! Track birth, confirmation, and termination — the state machine that
//! turns "an unassigned detection" into a new `Provisional` track and
//! eventually retires a track with a recorded [`TerminationCause`].

use crate::attributes::{AssocVariant, FilterVariant, StateAttributes};
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::error::Degeneracy;
use crate::histogram::AppearanceHistogram;
use crate::motion::MotionFilter;
use crate::registry::TrackRegistry;
use crate::timestamp::Timestamp;
use crate::track::{Track, TrackState, TrackStatus};

pub struct Lifecycle;

impl Lifecycle {
    /// Create a fresh `Provisional` track from an unassigned detection.
    /// `seed_window` is the short location history used to derive an
    /// initial heading for the `SpeedHeading` filter; empty for a
    /// brand-new track.
    pub fn birth(
        registry: &mut TrackRegistry,
        detection: &Detection,
        now: Timestamp,
        frame: u64,
        config: &TrackerConfig,
    ) -> u64 {
        let id = registry.reserve_id();
        let measurement = (detection.world_location.0, detection.world_location.1);
        let filter = MotionFilter::new(config.motion_model, measurement, &config.process_noise_matrix());
        let assoc = if config.multi_feature {
            AssocVariant::MultiFeatures
        } else {
            AssocVariant::Kinematic
        };
        let filter_variant = filter.variant();
        let state = TrackState {
            timestamp: now,
            location: measurement,
            velocity: (0.0, 0.0),
            image_location: Some(detection.image_location),
            world_location: Some(detection.world_location),
            bounding_box: Some(detection.bounding_box),
            location_covariance: filter.current_location_covariance(),
            attributes: StateAttributes::new(assoc, filter_variant),
            track_confidence: None,
        };
        let mut track = Track::new(id, frame, state, filter, config);
        if let Some(histogram) = &detection.appearance_histogram {
            track.appearance_cache.refresh(histogram);
        } else {
            track.appearance_cache.refresh(&AppearanceHistogram::empty());
        }
        let area = detection.area.or(Some(detection.bounding_box.area() as f64));
        track.record_area(area);
        registry.insert(track);
        id
    }

    /// Promote a `Provisional` track to `Active` once it has accumulated
    /// `N` observed frames within its `M`-frame confirmation window;
    /// discard it (returning `true`) if the window expires first without
    /// reaching `N`.
    ///
    /// Returns `true` if the track was discarded (removed from `registry`
    /// without ever being emitted).
    pub fn evaluate_confirmation(registry: &mut TrackRegistry, id: u64, frame: u64, config: &TrackerConfig) -> bool {
        let Some(track) = registry.get_mut(id) else {
            return false;
        };
        if track.status != TrackStatus::Provisional {
            return false;
        }
        let elapsed = track.frames_since_birth(frame);
        if track.observed_frames >= config.birth.n {
            track.status = TrackStatus::Active;
            return false;
        }
        if elapsed >= config.birth.m as u64 {
            registry.finalize(id);
            return true;
        }
        false
    }

    /// Check whether a live track should be terminated this frame: coast
    /// limit exceeded, left the configured AOI, or its filter has
    /// diverged. Finalizes and returns the track (with `termination_cause`
    /// set) if so.
    ///
    /// Only `Active`/`Coasting` tracks are considered: per spec.md §4.6's
    /// state machine, `Provisional` has no termination edge, only
    /// `Active` or a silent, unemitted discard on window expiry, which
    /// `evaluate_confirmation` owns exclusively.
    pub fn evaluate_termination(registry: &mut TrackRegistry, id: u64, config: &TrackerConfig) -> Option<Track> {
        let track = registry.get(id)?;
        if !matches!(track.status, TrackStatus::Active | TrackStatus::Coasting) {
            return None;
        }

        let cause = if track.missed_frames > config.coast_limit {
            Some(crate::track::TerminationCause::Coast)
        } else if let Some(aoi) = &config.aoi {
            let (x, y) = track.last_state().location;
            if aoi.contains_point(x, y) {
                None
            } else {
                Some(crate::track::TerminationCause::Aoi)
            }
        } else {
            None
        };

        let cause = cause.or_else(|| {
            if track.covariance_trace() > config.divergence_trace_cap {
                tracing::warn!(track_id = id, reason = Degeneracy::FilterDivergence.as_str(), "posterior covariance trace exceeded cap");
                Some(crate::track::TerminationCause::Divergence)
            } else {
                None
            }
        });

        let cause = cause?;
        tracing::info!(track_id = id, cause = ?cause, "terminating track");
        let mut track = registry.finalize(id)?;
        track.status = TrackStatus::Terminated;
        track.termination_cause = Some(cause);
        Some(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Aoi, Rect};

    fn detection_at(x: f64, y: f64) -> Detection {
        Detection::new((x, y), (x, y, 0.0), Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn birth_creates_provisional_track() {
        let mut registry = TrackRegistry::new();
        let config = TrackerConfig::default();
        let det = detection_at(1.0, 1.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        assert_eq!(registry.get(id).unwrap().status, TrackStatus::Provisional);
    }

    #[test]
    fn confirms_after_n_observed_frames() {
        let mut registry = TrackRegistry::new();
        let mut config = TrackerConfig::default();
        config.birth.n = 2;
        config.birth.m = 4;
        let det = detection_at(0.0, 0.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        registry.get_mut(id).unwrap().observed_frames = 2;
        let discarded = Lifecycle::evaluate_confirmation(&mut registry, id, 1, &config);
        assert!(!discarded);
        assert_eq!(registry.get(id).unwrap().status, TrackStatus::Active);
    }

    #[test]
    fn discards_on_window_expiry_without_confirmation() {
        let mut registry = TrackRegistry::new();
        let mut config = TrackerConfig::default();
        config.birth.n = 5;
        config.birth.m = 2;
        let det = detection_at(0.0, 0.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        let discarded = Lifecycle::evaluate_confirmation(&mut registry, id, 2, &config);
        assert!(discarded);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn terminates_on_coast_limit() {
        let mut registry = TrackRegistry::new();
        let mut config = TrackerConfig::default();
        config.coast_limit = 1;
        let det = detection_at(0.0, 0.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        registry.get_mut(id).unwrap().status = TrackStatus::Active;
        registry.get_mut(id).unwrap().missed_frames = 2;
        let terminated = Lifecycle::evaluate_termination(&mut registry, id, &config);
        assert!(terminated.is_some());
        assert_eq!(
            terminated.unwrap().termination_cause,
            Some(crate::track::TerminationCause::Coast)
        );
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn terminates_on_aoi_exit() {
        let mut registry = TrackRegistry::new();
        let mut config = TrackerConfig::default();
        config.aoi = Some(Aoi::new(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        let det = detection_at(500.0, 500.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        registry.get_mut(id).unwrap().status = TrackStatus::Active;
        let terminated = Lifecycle::evaluate_termination(&mut registry, id, &config);
        assert_eq!(
            terminated.unwrap().termination_cause,
            Some(crate::track::TerminationCause::Aoi)
        );
    }

    #[test]
    fn does_not_terminate_a_healthy_track() {
        let mut registry = TrackRegistry::new();
        let config = TrackerConfig::default();
        let det = detection_at(0.0, 0.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        registry.get_mut(id).unwrap().status = TrackStatus::Active;
        assert!(Lifecycle::evaluate_termination(&mut registry, id, &config).is_none());
    }

    #[test]
    fn provisional_track_is_never_terminated_even_past_coast_limit_or_outside_aoi() {
        let mut registry = TrackRegistry::new();
        let mut config = TrackerConfig::default();
        config.coast_limit = 0;
        config.aoi = Some(Aoi::new(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        // A brand-new Provisional track, seeded outside the AOI, with
        // missed_frames already past a coast_limit of 0. Neither condition
        // may terminate it: Provisional tracks only ever become Active or
        // are silently discarded by evaluate_confirmation on window expiry.
        let det = detection_at(500.0, 500.0);
        let id = Lifecycle::birth(&mut registry, &det, Timestamp::new(0, 0.0), 0, &config);
        registry.get_mut(id).unwrap().missed_frames = 1;
        assert!(Lifecycle::evaluate_termination(&mut registry, id, &config).is_none());
        assert_eq!(registry.get(id).unwrap().status, TrackStatus::Provisional);
    }
}
