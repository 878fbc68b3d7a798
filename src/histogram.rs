//! Fixed-dimension pixel-intensity histogram used for appearance similarity.
//!
//! Grounded on `original_source/library/utilities/image_histogram` usage in
//! `tracker_cost_func_color_size_kin_amhi.cxx`: a histogram with a `mass`
//! (zero means uninitialized) and a symmetric `compare` operation.

use serde::{Deserialize, Serialize};

pub const HISTOGRAM_BINS: usize = 32;

/// A normalized intensity histogram over a detection's bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppearanceHistogram {
    bins: Vec<f32>,
    mass: f32,
}

impl AppearanceHistogram {
    /// Build a histogram from raw (unnormalized) bin counts.
    pub fn from_counts(counts: &[f32]) -> Self {
        let mass: f32 = counts.iter().sum();
        let bins = if mass > 0.0 {
            counts.iter().map(|c| c / mass).collect()
        } else {
            vec![0.0; counts.len()]
        };
        Self { bins, mass }
    }

    /// An uninitialized histogram (`mass == 0`).
    pub fn empty() -> Self {
        Self {
            bins: vec![0.0; HISTOGRAM_BINS],
            mass: 0.0,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Symmetric similarity in `[0, 1]`, `1` meaning identical distributions.
    /// Uses histogram intersection, the classic normalized-histogram metric.
    pub fn similarity(&self, other: &AppearanceHistogram) -> f32 {
        if self.mass == 0.0 || other.mass == 0.0 {
            return 0.0;
        }
        let n = self.bins.len().min(other.bins.len());
        let mut intersection = 0.0f32;
        for i in 0..n {
            intersection += self.bins[i].min(other.bins[i]);
        }
        intersection.clamp(0.0, 1.0)
    }
}
