//! Ultrasonic ranger trait and the fail-open read rule

use thiserror::Error;

use crate::types::RangeReading;

/// Why a range sample is unusable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("no echo received")]
    NoEcho,

    #[error("reading out of range: {0}cm")]
    OutOfRange(f64),

    #[error("sensor disconnected: {0}")]
    Disconnected(String),
}

/// Single-beam distance sensor.
///
/// Implementations must return within bounded time; a non-responsive
/// sensor reports an error instead of blocking.
pub trait RangeSensor {
    /// Distance in centimeters
    fn read_distance_cm(&mut self) -> std::result::Result<f64, SensorError>;
}

impl<S: RangeSensor + ?Sized> RangeSensor for Box<S> {
    fn read_distance_cm(&mut self) -> std::result::Result<f64, SensorError> {
        (**self).read_distance_cm()
    }
}

/// Read one sample, turning any failure into an invalid reading.
///
/// Errors are logged and never propagated; the fusion layer treats an
/// invalid reading as "no obstacle from this modality".
pub fn read_range<S: RangeSensor + ?Sized>(sensor: &mut S) -> RangeReading {
    match sensor.read_distance_cm() {
        Ok(d) => {
            let reading = RangeReading::new(d);
            if !reading.valid {
                tracing::debug!("Discarding non-positive range sample {:.1}cm", d);
            }
            reading
        }
        Err(e) => {
            tracing::debug!("Range read failed, treating as far: {}", e);
            RangeReading::invalid()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<std::result::Result<f64, SensorError>>);

    impl RangeSensor for Scripted {
        fn read_distance_cm(&mut self) -> std::result::Result<f64, SensorError> {
            self.0.remove(0)
        }
    }

    #[test]
    fn test_read_range_fail_open() {
        let mut sensor = Scripted(vec![
            Ok(42.0),
            Ok(-1.0),
            Err(SensorError::NoEcho),
            Err(SensorError::Disconnected("i2c".to_string())),
        ]);

        let first = read_range(&mut sensor);
        assert!(first.valid);
        assert_eq!(first.distance_cm, 42.0);

        assert!(!read_range(&mut sensor).valid);
        assert!(!read_range(&mut sensor).valid);
        assert!(!read_range(&mut sensor).valid);
    }
}
