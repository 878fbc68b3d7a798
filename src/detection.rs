//! Per-frame detection records, produced externally and immutable once built.

use crate::geometry::Rect;
use crate::histogram::AppearanceHistogram;

/// A single per-frame candidate detection, as produced by the (external)
/// foreground/motion detector. Lives only for the frame in which it arrives.
#[derive(Debug, Clone)]
pub struct Detection {
    pub image_location: (f64, f64),
    pub world_location: (f64, f64, f64),
    pub bounding_box: Rect,
    pub appearance_histogram: Option<AppearanceHistogram>,
    pub area: Option<f64>,
}

impl Detection {
    pub fn new(image_location: (f64, f64), world_location: (f64, f64, f64), bounding_box: Rect) -> Self {
        Self {
            image_location,
            world_location,
            bounding_box,
            appearance_histogram: None,
            area: None,
        }
    }

    pub fn with_histogram(mut self, histogram: AppearanceHistogram) -> Self {
        self.appearance_histogram = Some(histogram);
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    /// `true` if any of the location fields carry a non-finite coordinate;
    /// used by `Tracker::step` to reject a frame as a contract violation.
    pub fn has_non_finite_coordinates(&self) -> bool {
        let (ix, iy) = self.image_location;
        let (wx, wy, wz) = self.world_location;
        !(ix.is_finite() && iy.is_finite() && wx.is_finite() && wy.is_finite() && wz.is_finite())
    }
}
