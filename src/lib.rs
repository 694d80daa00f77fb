//! # Kavach
//!
//! Reactive obstacle avoidance for a small Ackermann-steered car with a
//! forward camera (object detector) and a single ultrasonic ranger.
//!
//! ## Overview
//!
//! Each control tick reduces the two sensors to one proximity [`Zone`]:
//!
//! - **Safe** - cruise straight ahead
//! - **Caution** - slow down and veer slightly left
//! - **Danger** - stop, reverse with the wheels turned, then resume; the turn
//!   direction alternates between consecutive maneuvers
//!
//! A centered, confident camera detection is Danger on its own. A missing or
//! failed ultrasonic reading never forces Danger (fail-open ranging).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kavach::{ControlLoop, KavachConfig, devices::mock::MockDevice};
//!
//! let config = KavachConfig::default();
//! let sim = MockDevice::new(config.device.simulation.clone());
//! let mut control = ControlLoop::new(&config, sim.actuator(), sim.range_sensor(), sim.camera())?;
//!
//! let report = control.tick()?;
//! println!("{} -> {}", report.zone, report.state);
//! ```
//!
//! ## Conventions
//!
//! - Distances in centimeters, angles in degrees
//! - Steering: left negative, right positive
//! - Speeds: abstract 0-100 units

pub mod app;
pub mod config;
pub mod control;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod perception;
pub mod types;

pub use app::{ControlLoop, DeviceLoop, TickReport};
pub use config::{ControlMode, KavachConfig};
pub use control::{AvoidanceController, DriveState, EvasiveManeuver, ManeuverStep};
pub use drivers::{ActuatorPort, DetectionSource, DriveCommand, RangeSensor, SensorError, Throttle};
pub use error::{KavachError, Result};
pub use perception::{ObstacleFusion, TargetBearingEstimator, VisionObstacleFilter};
pub use types::{
    BoundingBox, ClassId, Detection, DetectionSet, Motion, RangeReading, TargetState,
    TurnDirection, Zone,
};
