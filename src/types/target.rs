//! Tracked target state

use std::fmt;

use super::detection::{BoundingBox, ClassId};

/// Single-frame "best detection" target description.
///
/// Geometric fields are meaningless when `has_target` is false.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetState {
    pub has_target: bool,
    /// Clamped bounding box in pixels
    pub bbox: Option<BoundingBox>,
    /// Horizontal center, -1 (left edge) to 1 (right edge)
    pub center_x_norm: f64,
    /// Vertical center, -1 (top edge) to 1 (bottom edge)
    pub center_y_norm: f64,
    /// Approximate bearing, left negative / right positive
    pub bearing_deg: f64,
    /// `1 / bbox_height_px`; larger means farther, relative only
    pub distance_hint: f64,
    pub class_id: Option<ClassId>,
    pub score: f32,
}

impl TargetState {
    /// State with no target and all geometry cleared
    pub fn none() -> Self {
        Self::default()
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.has_target, self.bbox) {
            (true, Some(b)) => write!(
                f,
                "target class={} bearing={:.1}° bbox=({:.0}, {:.0}, {:.0}, {:.0}) score={:.2}",
                self.class_id.map_or_else(|| "?".to_string(), |c| c.to_string()),
                self.bearing_deg,
                b.x1,
                b.y1,
                b.x2,
                b.y2,
                self.score
            ),
            _ => f.write_str("no target"),
        }
    }
}
