//! Rule-based camera + ultrasonic fusion.
//!
//! Priority order:
//! 1. a valid reading closer than `danger_cm`, or a camera obstacle in the
//!    front corridor, is Danger
//! 2. a valid reading closer than `caution_cm` is Caution
//! 3. anything else is Safe
//!
//! An invalid reading never raises the zone (ranging fails open). There is no
//! hysteresis or debouncing: a single sample below a boundary flips the zone.

use crate::config::ZoneConfig;
use crate::error::{KavachError, Result};
use crate::types::{RangeReading, Zone};

/// Classify one tick's inputs into a proximity zone.
pub fn classify(
    vision_obstacle: bool,
    range: RangeReading,
    caution_cm: f64,
    danger_cm: f64,
) -> Zone {
    if vision_obstacle || range.is_closer_than(danger_cm) {
        Zone::Danger
    } else if range.is_closer_than(caution_cm) {
        Zone::Caution
    } else {
        Zone::Safe
    }
}

/// Fusion with validated thresholds.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleFusion {
    danger_cm: f64,
    caution_cm: f64,
}

impl ObstacleFusion {
    /// Fails unless `0 < danger_cm < caution_cm` with a finite `caution_cm`.
    pub fn new(danger_cm: f64, caution_cm: f64) -> Result<Self> {
        if !(danger_cm > 0.0 && caution_cm.is_finite() && danger_cm < caution_cm) {
            return Err(KavachError::Config(format!(
                "zone thresholds must satisfy 0 < danger_cm < caution_cm, got {} / {}",
                danger_cm, caution_cm
            )));
        }
        Ok(Self {
            danger_cm,
            caution_cm,
        })
    }

    pub fn from_config(config: &ZoneConfig) -> Result<Self> {
        Self::new(config.danger_cm, config.caution_cm)
    }

    pub fn classify(&self, vision_obstacle: bool, range: RangeReading) -> Zone {
        classify(vision_obstacle, range, self.caution_cm, self.danger_cm)
    }
}
