//! Camera-based "obstacle ahead" test.
//!
//! The front corridor is the horizontal pixel band
//! `[w * (0.5 - f/2), w * (0.5 + f/2)]`, bounds inclusive. A detection counts
//! when its confidence passes the threshold, its class is allowed, and the
//! horizontal center of its box lies inside the corridor.

use std::collections::HashSet;

use crate::config::PerceptionConfig;
use crate::types::{ClassId, Detection, DetectionSet};

/// Reduce a frame's detections to a single obstacle-ahead flag.
///
/// Returns false for an empty set. Detections below `confidence_threshold`
/// or outside `allowed_classes` (when given) never contribute.
pub fn is_obstacle_in_front(
    detections: &DetectionSet,
    frame_width: f64,
    center_region_fraction: f64,
    confidence_threshold: f32,
    allowed_classes: Option<&HashSet<ClassId>>,
) -> bool {
    if detections.is_empty() {
        return false;
    }

    let (x_min, x_max) = corridor(frame_width, center_region_fraction);

    detections
        .iter()
        .filter(|d| qualifies(d, confidence_threshold, allowed_classes))
        .any(|d| {
            let cx = d.bbox.center_x();
            x_min <= cx && cx <= x_max
        })
}

/// Horizontal pixel band treated as straight ahead
#[inline]
pub fn corridor(frame_width: f64, center_region_fraction: f64) -> (f64, f64) {
    let half = center_region_fraction / 2.0;
    (frame_width * (0.5 - half), frame_width * (0.5 + half))
}

#[inline]
fn qualifies(d: &Detection, threshold: f32, allowed: Option<&HashSet<ClassId>>) -> bool {
    if d.confidence < threshold {
        return false;
    }
    allowed.is_none_or(|classes| classes.contains(&d.class_id))
}

/// Configured front-corridor filter.
#[derive(Clone, Debug)]
pub struct VisionObstacleFilter {
    center_region_fraction: f64,
    confidence_threshold: f32,
    allowed_classes: Option<HashSet<ClassId>>,
}

impl VisionObstacleFilter {
    pub fn new(
        center_region_fraction: f64,
        confidence_threshold: f32,
        allowed_classes: Option<HashSet<ClassId>>,
    ) -> Self {
        Self {
            center_region_fraction,
            confidence_threshold,
            allowed_classes,
        }
    }

    pub fn from_config(config: &PerceptionConfig) -> Self {
        Self::new(
            config.center_region_fraction,
            config.confidence_threshold,
            config.allowed_classes(),
        )
    }

    /// Obstacle test using the frame width carried by the set.
    pub fn check(&self, detections: &DetectionSet) -> bool {
        self.is_obstacle_in_front(detections, detections.frame_width as f64)
    }

    /// Obstacle test against an explicit frame width.
    pub fn is_obstacle_in_front(&self, detections: &DetectionSet, frame_width: f64) -> bool {
        is_obstacle_in_front(
            detections,
            frame_width,
            self.center_region_fraction,
            self.confidence_threshold,
            self.allowed_classes.as_ref(),
        )
    }
}
