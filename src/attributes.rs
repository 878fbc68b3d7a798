//! Track-state attribute bit-field.
//!
//! Grounded on `original_source/library/tracking_data/track_state_attributes.h`'s
//! `state_attr_t` groups. Descriptive only: nothing in the core reads these
//! bits to make a decision, they are provenance/phase markers propagated
//! verbatim to sinks. Modeled as explicit bit groups rather than the
//! original's free-form `raw_attrs_t` so call sites can't accidentally set
//! two values from the same group at once.

use serde::{Deserialize, Serialize};

/// Which association variant produced a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssocVariant {
    Kinematic,
    MultiFeatures,
}

/// Which motion-filter variant is active for the track that produced a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterVariant {
    Linear,
    SpeedHeading,
}

/// Interval phase a state was produced in. The core only ever produces
/// `Forward` states (causal, single-pass); `Init`/`Back` are carried for
/// sinks that merge output from an offline back-tracking pass, per the
/// original's three-way `ATTR_INTERVAL_*` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalPhase {
    Init,
    Forward,
    Back,
}

/// Linking markers: is this state the first/last of the track it belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkingMarkers {
    pub start: bool,
    pub end: bool,
}

/// The attribute bit-field attached to every [`crate::track::TrackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAttributes {
    pub assoc: AssocVariant,
    pub filter: FilterVariant,
    pub interval: IntervalPhase,
    pub linking: LinkingMarkers,
}

impl StateAttributes {
    pub fn new(assoc: AssocVariant, filter: FilterVariant) -> Self {
        Self {
            assoc,
            filter,
            interval: IntervalPhase::Forward,
            linking: LinkingMarkers::default(),
        }
    }
}
