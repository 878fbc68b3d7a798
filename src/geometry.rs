//! Bounding boxes and the Area-Of-Interest polygon test.
//!
//! `Rect` is a plain TLWH box used only to carry detection geometry through
//! to sinks, not in the motion model itself (which tracks point locations).

use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in top-left/width/height form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Apply a 3x3 projective transform (row-major) to a stabilized-plane point,
/// producing a `(x, y, z=0)` world-frame location: `[x, y, 1] · Mᵀ`,
/// normalized by the resulting homogeneous weight. Used to enrich a
/// coasting track's state with `world_location` when no detection supplied
/// one directly.
pub fn apply_plane_to_world(transform: &[[f64; 3]; 3], point: (f64, f64)) -> (f64, f64, f64) {
    let (x, y) = point;
    let row = |r: usize| transform[r][0] * x + transform[r][1] * y + transform[r][2];
    let w = row(2);
    if w == 0.0 || !w.is_finite() {
        return (x, y, 0.0);
    }
    (row(0) / w, row(1) / w, 0.0)
}

/// A simple closed polygon scoping which tracks are retained, in the
/// stabilized-plane coordinate system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aoi {
    vertices: Vec<(f64, f64)>,
}

impl Aoi {
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self { vertices }
    }

    /// True if `(x, y)` lies within the polygon (boundary counts as inside).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        if self.vertices.len() < 3 {
            return true;
        }
        let coords: Vec<Coord<f64>> = self
            .vertices
            .iter()
            .map(|&(vx, vy)| Coord { x: vx, y: vy })
            .collect();
        let polygon = Polygon::new(LineString(coords), vec![]);
        let point = Point::new(x, y);
        polygon.contains(&point) || polygon.exterior().contains(&point)
    }
}
