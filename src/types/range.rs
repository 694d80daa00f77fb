//! Ultrasonic range types

/// A single ultrasonic distance sample
///
/// Produced fresh every tick and never retained. An invalid reading means
/// "this modality indicates no obstacle" (ranging fails open).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReading {
    /// Distance to the nearest echo in centimeters
    pub distance_cm: f64,
    /// False whenever the sensor returned a non-positive or missing value
    pub valid: bool,
}

impl RangeReading {
    /// Build a reading from a raw sensor value.
    ///
    /// Non-positive and non-finite values are marked invalid.
    pub fn new(distance_cm: f64) -> Self {
        Self {
            distance_cm,
            valid: distance_cm.is_finite() && distance_cm > 0.0,
        }
    }

    /// Reading for a missing or failed sample
    pub fn invalid() -> Self {
        Self {
            distance_cm: 0.0,
            valid: false,
        }
    }

    /// Distance if the reading is usable
    #[inline]
    pub fn distance(&self) -> Option<f64> {
        self.valid.then_some(self.distance_cm)
    }

    /// True if the reading is valid and strictly closer than `threshold_cm`
    #[inline]
    pub fn is_closer_than(&self, threshold_cm: f64) -> bool {
        self.valid && self.distance_cm < threshold_cm
    }
}

impl From<Option<f64>> for RangeReading {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::new).unwrap_or_else(Self::invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_is_invalid() {
        assert!(!RangeReading::new(0.0).valid);
        assert!(!RangeReading::new(-1.0).valid);
        assert!(!RangeReading::new(f64::NAN).valid);
        assert!(RangeReading::new(12.5).valid);
    }

    #[test]
    fn test_missing_value_is_invalid() {
        let reading = RangeReading::from(None);
        assert!(!reading.valid);
        assert_eq!(reading.distance(), None);
    }

    #[test]
    fn test_invalid_never_closer() {
        let reading = RangeReading {
            distance_cm: 5.0,
            valid: false,
        };
        assert!(!reading.is_closer_than(25.0));
        assert!(RangeReading::new(5.0).is_closer_than(25.0));
    }
}
