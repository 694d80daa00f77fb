//! Hardware-free simulation of a small Ackermann-steered car
//!
//! | Component | Simulation |
//! |-----------|------------|
//! | Steering + drive motor | Kinematic bicycle model, stop-on-contact collisions |
//! | Ultrasonic ranger | Beam cone against circular obstacles, Gaussian noise, dropouts |
//! | Object detector | Pinhole projection of classed obstacles, confidence noise, dropped frames |
//!
//! All three share one [`SimWorld`] behind a mutex. The ranger advances the
//! world clock on every read, so one control tick equals one step.
//!
//! ```toml
//! [device]
//! type = "mock"
//!
//! [device.simulation]
//! random_seed = 42      # 0 = random each run
//! fixed_step_ms = 50    # omit to follow wall time
//!
//! [[device.simulation.obstacles]]
//! x_cm = 150.0
//! y_cm = 0.0
//! class_id = 0
//! ```

pub mod actuator;
pub mod config;
mod noise;
pub mod sensors;
pub mod world;

pub use actuator::{ActuatorCall, MockActuator};
pub use config::{ObstacleConfig, SimulationConfig};
pub use sensors::{MockCamera, MockRangeSensor};
pub use world::{Pose, SimWorld};

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

/// The simulated car with handles into its shared world
pub struct MockDevice {
    world: Arc<Mutex<SimWorld>>,
    actuator: MockActuator,
}

impl MockDevice {
    pub fn new(config: SimulationConfig) -> Self {
        info!(
            "Mock device: {} obstacle(s), seed {}, step {}",
            config.obstacles.len(),
            config.random_seed,
            config
                .fixed_step_ms
                .map_or_else(|| "wall clock".to_string(), |ms| format!("{ms}ms"))
        );
        let world = Arc::new(Mutex::new(SimWorld::new(config)));
        let actuator = MockActuator::attached(world.clone());
        Self { world, actuator }
    }

    /// Actuator handle; clones share the call log
    pub fn actuator(&self) -> MockActuator {
        self.actuator.clone()
    }

    pub fn range_sensor(&self) -> MockRangeSensor {
        MockRangeSensor::new(self.world.clone())
    }

    pub fn camera(&self) -> MockCamera {
        MockCamera::new(self.world.clone())
    }

    pub fn pose(&self) -> Pose {
        self.world.lock().pose()
    }

    pub fn collisions(&self) -> u32 {
        self.world.lock().collisions()
    }
}
