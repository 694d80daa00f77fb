//! Object detector output types

/// COCO class identifier as emitted by the detector
pub type ClassId = i32;

/// Axis-aligned bounding box in pixel coordinates
///
/// Always satisfies `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a bounding box, reordering corners if needed
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.y1 + self.y2) / 2.0
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Clamp all corners into `[0, w] x [0, h]`
    pub fn clamped(&self, frame_width: f64, frame_height: f64) -> Self {
        Self {
            x1: self.x1.clamp(0.0, frame_width),
            y1: self.y1.clamp(0.0, frame_height),
            x2: self.x2.clamp(0.0, frame_width),
            y2: self.y2.clamp(0.0, frame_height),
        }
    }
}

/// A single detected object in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: ClassId,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: ClassId, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

/// All detections for one camera frame, in detector output order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionSet {
    pub frame_width: u32,
    pub frame_height: u32,
    pub detections: Vec<Detection>,
}

impl DetectionSet {
    /// Create an empty set for a frame of the given size
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            detections: Vec::new(),
        }
    }

    /// Create a set from existing detections
    pub fn with_detections(
        frame_width: u32,
        frame_height: u32,
        detections: Vec<Detection>,
    ) -> Self {
        Self {
            frame_width,
            frame_height,
            detections,
        }
    }

    pub fn push(&mut self, detection: Detection) {
        self.detections.push(detection);
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    /// Highest-confidence detection, first one wins on ties
    pub fn best(&self) -> Option<&Detection> {
        best_by_confidence(self.detections.iter())
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

/// Pick the maximum-confidence detection with a stable first-seen tie-break.
///
/// `Iterator::max_by` returns the *last* maximum, so fold manually.
pub(crate) fn best_by_confidence<'a, I>(detections: I) -> Option<&'a Detection>
where
    I: IntoIterator<Item = &'a Detection>,
{
    detections.into_iter().fold(None, |best, d| match best {
        Some(b) if b.confidence >= d.confidence => Some(b),
        _ => Some(d),
    })
}
