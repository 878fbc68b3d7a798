//! Online multi-target video tracking core.
//!
//! Maintains per-target motion state across frames, scores candidate
//! detection↔track assignments under a gated multi-feature cost model,
//! resolves the assignment globally each frame via bipartite matching, and
//! manages track birth, confirmation, coasting, and termination. Frame
//! acquisition, stabilization, detection, and persistence are external
//! collaborators; this crate only implements the tracker itself.

mod assign;
mod attributes;
mod config;
mod cost;
mod detection;
mod engine;
mod error;
mod geometry;
mod histogram;
mod lifecycle;
mod motion;
mod registry;
mod timestamp;
mod track;
mod updater;

pub use attributes::{AssocVariant, FilterVariant, IntervalPhase, LinkingMarkers, StateAttributes};
pub use config::{BirthConfig, MotionModel, TrackerConfig, Weights};
pub use detection::Detection;
pub use engine::{PlaneToWorld, Tracker};
pub use error::{Result, TrackerError};
pub use geometry::{Aoi, Rect};
pub use histogram::{AppearanceHistogram, HISTOGRAM_BINS};
pub use motion::LocationEstimate;
pub use timestamp::Timestamp;
pub use track::{AppearanceCache, TerminationCause, Track, TrackState, TrackStatus};
