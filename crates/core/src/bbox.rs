//! Bounding-box math for person detections.

use serde::{Deserialize, Serialize};

/// A bounding box in pixel coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Clamp this box to the frame bounds.
    ///
    /// The origin is clamped into `[0, dim - 1]` and the extent is shrunk
    /// so the box lies fully inside the frame. Returns `None` when the
    /// clamped width or height is not positive — degenerate boxes must be
    /// dropped before persistence, never stored with zero dimensions.
    pub fn clamp_to_frame(&self, frame_width: i32, frame_height: i32) -> Option<BBox> {
        if frame_width <= 0 || frame_height <= 0 {
            return None;
        }
        let x = self.x.clamp(0, frame_width - 1);
        let y = self.y.clamp(0, frame_height - 1);
        let width = self.width.min(frame_width - x);
        let height = self.height.min(frame_height - y);

        if width <= 0 || height <= 0 {
            return None;
        }
        Some(BBox { x, y, width, height })
    }

    /// Area in pixels. Assumes a clamped, non-degenerate box.
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
