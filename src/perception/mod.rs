//! Perception: turning raw detections and range samples into decisions.
//!
//! - [`vision`]: front-corridor obstacle test over a frame's detections
//! - [`bearing`]: best-target selection with normalized position and bearing
//! - [`fusion`]: camera + ultrasonic rule-based fusion into a [`Zone`](crate::types::Zone)

pub mod bearing;
pub mod fusion;
pub mod vision;

pub use bearing::TargetBearingEstimator;
pub use fusion::ObstacleFusion;
pub use vision::{VisionObstacleFilter, is_obstacle_in_front};
