//! Drive states and transition table.
//!
//! | Current | Safe | Caution | Danger |
//! |---|---|---|---|
//! | Cruise | Cruise | CautionDrive | Evading |
//! | CautionDrive | Cruise | CautionDrive | Evading |
//! | Evading (running) | Evading | Evading | Evading |
//! | Evading (complete) | Cruise | CautionDrive | Evading (restart) |

use std::fmt;

use crate::config::DriveConfig;
use crate::drivers::{DriveCommand, Throttle};
use crate::types::Zone;

/// Top-level avoidance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveState {
    /// Clear path, full cruise speed
    #[default]
    Cruise,
    /// Something within caution range, slowed with a search bias
    CautionDrive,
    /// Timed evasive maneuver in progress
    Evading,
}

impl DriveState {
    /// State a zone maps to when no maneuver is holding the controller
    pub fn for_zone(zone: Zone) -> Self {
        match zone {
            Zone::Safe => DriveState::Cruise,
            Zone::Caution => DriveState::CautionDrive,
            Zone::Danger => DriveState::Evading,
        }
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveState::Cruise => f.write_str("Cruise"),
            DriveState::CautionDrive => f.write_str("CautionDrive"),
            DriveState::Evading => f.write_str("Evading"),
        }
    }
}

/// Next state for this tick.
///
/// A running maneuver is open-loop: the zone is ignored until it completes.
pub fn transition(current: DriveState, zone: Zone, maneuver_complete: bool) -> DriveState {
    match current {
        DriveState::Evading if !maneuver_complete => DriveState::Evading,
        _ => DriveState::for_zone(zone),
    }
}

/// Command re-issued every tick while in a steady state.
///
/// Evading returns `None`; the maneuver owns the actuator.
pub fn steady_command(state: DriveState, drive: &DriveConfig) -> Option<DriveCommand> {
    match state {
        DriveState::Cruise => Some(DriveCommand::new(0.0, Throttle::Forward(drive.cruise_speed))),
        DriveState::CautionDrive => Some(DriveCommand::new(
            drive.caution_steer_deg,
            Throttle::Forward(drive.caution_speed),
        )),
        DriveState::Evading => None,
    }
}
