//! Camera + detector trait

use crate::types::DetectionSet;

/// Source of per-frame detections.
///
/// May run at a different cadence than the control loop: `None` means no new
/// frame is available this tick.
pub trait DetectionSource {
    fn poll_detections(&mut self) -> Option<DetectionSet>;
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    fn poll_detections(&mut self) -> Option<DetectionSet> {
        (**self).poll_detections()
    }
}
