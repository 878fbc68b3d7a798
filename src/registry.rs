//! Owns the set of live tracks and issues ids.
//!
//! The registry is the sole authority that mutates the set of live tracks;
//! every other component receives either a scoped `&mut Track` for the
//! duration of a single step, or a stable `id` to cross-reference by.

use std::collections::BTreeMap;

use crate::track::Track;

#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh, monotonically increasing id and insert `track`
    /// (whose `id` field the caller should already have set from
    /// [`TrackRegistry::reserve_id`]).
    pub(crate) fn reserve_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, track: Track) {
        self.tracks.insert(track.id, track);
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    /// Remove a track from the live set and return ownership. Returns
    /// `None` if `id` is not live (finalize is idempotent-fail: a second
    /// call with the same id reports "not live" rather than panicking).
    pub fn finalize(&mut self, id: u64) -> Option<Track> {
        self.tracks.remove(&id)
    }

    /// Stable, ascending-by-id ordering, used when constructing cost
    /// matrices so row order is reproducible.
    pub fn live_ids(&self) -> Vec<u64> {
        self.tracks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
