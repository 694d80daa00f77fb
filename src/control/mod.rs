//! Avoidance control
//!
//! - [`state`]: drive states and the pure zone transition table
//! - [`maneuver`]: timed evasive maneuver as a non-blocking sub-state machine
//! - [`controller`]: [`AvoidanceController`], owner of all cross-tick state

pub mod controller;
pub mod maneuver;
pub mod state;

pub use controller::AvoidanceController;
pub use maneuver::{EvasiveManeuver, ManeuverStep};
pub use state::{DriveState, steady_command, transition};
