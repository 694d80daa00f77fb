//! Best-target selection and bearing estimation.
//!
//! Each update looks at one frame only; there is no tracking across frames.
//! Detections of a preferred class win when any are present, otherwise any
//! detection is used. The highest-confidence survivor is the target, first
//! in input order on ties.
//!
//! The bearing is a linear small-angle approximation over an assumed
//! horizontal field of view, not a calibrated projection. The distance hint
//! is `1 / bbox_height_px` and is only comparable across frames of the same
//! camera.

use std::collections::HashSet;

use crate::config::PerceptionConfig;
use crate::types::{ClassId, DetectionSet, TargetState, detection::best_by_confidence};

/// Selects a tracked target and computes its normalized position.
#[derive(Clone, Debug)]
pub struct TargetBearingEstimator {
    preferred_classes: HashSet<ClassId>,
    half_fov_deg: f64,
    state: TargetState,
}

impl TargetBearingEstimator {
    pub fn new(preferred_classes: HashSet<ClassId>, half_fov_deg: f64) -> Self {
        Self {
            preferred_classes,
            half_fov_deg,
            state: TargetState::none(),
        }
    }

    pub fn from_config(config: &PerceptionConfig) -> Self {
        Self::new(config.preferred_classes(), config.half_fov_deg)
    }

    /// Last computed target state
    pub fn state(&self) -> &TargetState {
        &self.state
    }

    /// Recompute the target from the frame's own dimensions.
    pub fn update_from(&mut self, detections: &DetectionSet) -> TargetState {
        self.update(
            detections,
            detections.frame_width as f64,
            detections.frame_height as f64,
        )
    }

    /// Recompute the target from one frame of detections.
    pub fn update(&mut self, detections: &DetectionSet, frame_w: f64, frame_h: f64) -> TargetState {
        let preferred = best_by_confidence(
            detections
                .iter()
                .filter(|d| self.preferred_classes.contains(&d.class_id)),
        );

        let Some(best) = preferred.or_else(|| detections.best()) else {
            self.state = TargetState::none();
            return self.state;
        };

        let frame_w = frame_w.max(1.0);
        let frame_h = frame_h.max(1.0);
        let bbox = best.bbox.clamped(frame_w, frame_h);

        let bbox_w = bbox.width().max(1.0);
        let bbox_h = bbox.height().max(1.0);
        let cx = bbox.x1 + bbox_w / 2.0;
        let cy = bbox.y1 + bbox_h / 2.0;

        let center_x_norm = (cx - frame_w / 2.0) / (frame_w / 2.0);
        let center_y_norm = (cy - frame_h / 2.0) / (frame_h / 2.0);

        self.state = TargetState {
            has_target: true,
            bbox: Some(bbox),
            center_x_norm,
            center_y_norm,
            bearing_deg: center_x_norm * self.half_fov_deg,
            distance_hint: 1.0 / bbox_h,
            class_id: Some(best.class_id),
            score: best.confidence,
        };

        tracing::trace!("Target update: {}", self.state);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Detection};
    use approx::assert_relative_eq;

    fn estimator() -> TargetBearingEstimator {
        TargetBearingEstimator::new(HashSet::from([0, 1, 2, 3, 7]), 45.0)
    }

    fn frame(detections: Vec<Detection>) -> DetectionSet {
        DetectionSet::with_detections(640, 480, detections)
    }

    #[test]
    fn test_empty_set_has_no_target() {
        let mut est = estimator();
        let state = est.update_from(&frame(vec![]));
        assert!(!state.has_target);
        assert!(state.bbox.is_none());
        assert!(state.class_id.is_none());
        assert_eq!(state.to_string(), "no target");
    }

    #[test]
    fn test_highest_confidence_wins() {
        let mut est = estimator();
        let state = est.update_from(&frame(vec![
            Detection::new(0, 0.6, BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            Detection::new(0, 0.9, BoundingBox::new(300.0, 200.0, 340.0, 280.0)),
        ]));
        assert!(state.has_target);
        assert_eq!(state.score, 0.9);
        assert_relative_eq!(state.center_x_norm, 0.0);
    }

    #[test]
    fn test_tie_break_first_seen() {
        let mut est = estimator();
        let state = est.update_from(&frame(vec![
            Detection::new(2, 0.8, BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            Detection::new(3, 0.8, BoundingBox::new(300.0, 0.0, 400.0, 100.0)),
        ]));
        assert_eq!(state.class_id, Some(2));
    }

    #[test]
    fn test_preferred_class_beats_higher_score() {
        let mut est = estimator();
        let state = est.update_from(&frame(vec![
            Detection::new(56, 0.95, BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            Detection::new(0, 0.5, BoundingBox::new(500.0, 0.0, 600.0, 100.0)),
        ]));
        assert_eq!(state.class_id, Some(0));
    }

    #[test]
    fn test_falls_back_to_any_class() {
        let mut est = estimator();
        let state = est.update_from(&frame(vec![
            Detection::new(56, 0.4, BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            Detection::new(62, 0.7, BoundingBox::new(500.0, 0.0, 600.0, 100.0)),
        ]));
        assert!(state.has_target);
        assert_eq!(state.class_id, Some(62));
    }

    #[test]
    fn test_geometry() {
        let mut est = estimator();
        // Right edge half of the frame: center at x=480
        let state = est.update_from(&frame(vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(440.0, 0.0, 520.0, 120.0),
        )]));
        assert_relative_eq!(state.center_x_norm, 0.5);
        assert_relative_eq!(state.bearing_deg, 22.5);
        assert_relative_eq!(state.center_y_norm, -0.75);
        assert_relative_eq!(state.distance_hint, 1.0 / 120.0);
        assert!(state.to_string().starts_with("target class=0 bearing=22.5°"));
    }

    #[test]
    fn test_box_clamped_and_floored() {
        let mut est = estimator();
        // Entirely left of the frame: clamps to a zero-width box at x=0
        let state = est.update_from(&frame(vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(-80.0, 50.0, -20.0, 50.0),
        )]));
        let bbox = state.bbox.unwrap();
        assert_eq!(bbox.x1, 0.0);
        assert_eq!(bbox.x2, 0.0);
        assert!(state.distance_hint.is_finite());
        assert_relative_eq!(state.distance_hint, 1.0);
        assert_relative_eq!(state.center_x_norm, (0.5 - 320.0) / 320.0);
        assert!(state.bearing_deg >= -45.0);
    }

    #[test]
    fn test_state_cleared_between_frames() {
        let mut est = estimator();
        est.update_from(&frame(vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        )]));
        assert!(est.state().has_target);
        est.update_from(&frame(vec![]));
        assert!(!est.state().has_target);
    }

    #[test]
    fn test_smaller_box_is_farther() {
        let mut est = estimator();
        let near = est.update_from(&frame(vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(300.0, 100.0, 340.0, 400.0),
        )]));
        let far = est.update_from(&frame(vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(300.0, 100.0, 340.0, 150.0),
        )]));
        assert!(far.distance_hint > near.distance_hint);
    }
}
