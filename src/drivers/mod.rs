//! Collaborator traits at the hardware boundary
//!
//! - [`ActuatorPort`]: steering servo and drive motor
//! - [`RangeSensor`]: single-beam ultrasonic ranger
//! - [`DetectionSource`]: camera + object detector

pub mod actuator;
pub mod range;
pub mod vision;

pub use actuator::{ActuatorPort, DriveCommand, Throttle};
pub use range::{RangeSensor, SensorError, read_range};
pub use vision::DetectionSource;
