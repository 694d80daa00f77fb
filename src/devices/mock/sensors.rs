//! Simulated ultrasonic ranger and detector camera

use std::sync::Arc;

use parking_lot::Mutex;

use super::world::SimWorld;
use crate::drivers::{DetectionSource, RangeSensor, SensorError};
use crate::types::DetectionSet;

/// Ultrasonic ranger backed by the shared world.
///
/// Each read is one control tick, so it also advances the simulation clock.
pub struct MockRangeSensor {
    world: Arc<Mutex<SimWorld>>,
}

impl MockRangeSensor {
    pub fn new(world: Arc<Mutex<SimWorld>>) -> Self {
        Self { world }
    }
}

impl RangeSensor for MockRangeSensor {
    fn read_distance_cm(&mut self) -> std::result::Result<f64, SensorError> {
        let mut world = self.world.lock();
        world.advance();
        world.ping()
    }
}

/// Detector camera backed by the shared world
pub struct MockCamera {
    world: Arc<Mutex<SimWorld>>,
}

impl MockCamera {
    pub fn new(world: Arc<Mutex<SimWorld>>) -> Self {
        Self { world }
    }
}

impl DetectionSource for MockCamera {
    fn poll_detections(&mut self) -> Option<DetectionSet> {
        self.world.lock().capture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::{ObstacleConfig, SimulationConfig};
    use approx::assert_relative_eq;

    #[test]
    fn test_range_reads_advance_the_clock() {
        let world = Arc::new(Mutex::new(SimWorld::new(SimulationConfig::noiseless(vec![
            ObstacleConfig {
                x_cm: 100.0,
                y_cm: 0.0,
                radius_cm: 10.0,
                height_cm: 30.0,
                class_id: None,
            },
        ]))));
        world.lock().set_throttle(20.0);
        let mut ranger = MockRangeSensor::new(world.clone());

        let first = ranger.read_distance_cm().unwrap();
        let second = ranger.read_distance_cm().unwrap();

        // 20 cm/s over one 50 ms step
        assert_relative_eq!(first - second, 1.0, epsilon = 1e-6);
        assert_eq!(world.lock().sim_time().as_millis(), 100);
    }

    #[test]
    fn test_camera_polls_do_not_move_the_car() {
        let world = Arc::new(Mutex::new(SimWorld::new(SimulationConfig::noiseless(vec![]))));
        world.lock().set_throttle(50.0);
        let mut camera = MockCamera::new(world.clone());

        let frame = camera.poll_detections().unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.frame_width, 640);
        assert_eq!(world.lock().pose().x_cm, 0.0);
    }
}
