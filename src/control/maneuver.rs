//! Evasive maneuver sub-state machine.
//!
//! Fixed timed script, advanced once per tick without blocking:
//!
//! ```text
//! Braking ──(pause_s)──▶ Reversing ──(reverse_duration_s)──▶ Done
//!  stop                   steer ±turn, backward              steer 0, stop
//! ```
//!
//! Steps are entered on the tick where the previous step's elapsed time
//! reaches its duration, so each tick issues at most one composite command.
//! Sensor data is not consulted mid-maneuver.

use std::time::{Duration, Instant};

use crate::config::EvasionConfig;
use crate::drivers::{DriveCommand, Throttle};
use crate::types::TurnDirection;

/// Current step of the maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverStep {
    /// Stopped, waiting out the pause
    Braking,
    /// Steered toward the turn direction and backing up
    Reversing,
    /// Stopped with steering centered
    Done,
}

/// Result of advancing the maneuver by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverUpdate {
    pub command: Option<DriveCommand>,
    pub finished: bool,
}

/// One timed evasive maneuver.
#[derive(Debug, Clone)]
pub struct EvasiveManeuver {
    step: ManeuverStep,
    step_started: Instant,
    /// Monotonic count of steps entered, starting at 1 for Braking
    step_counter: u32,
    direction: TurnDirection,
    turn_angle_deg: f64,
    reverse_speed: u8,
    pause: Duration,
    reverse_duration: Duration,
}

impl EvasiveManeuver {
    /// Begin a maneuver at `now`; the caller issues [`Self::initial_command`].
    pub fn start(now: Instant, direction: TurnDirection, config: &EvasionConfig) -> Self {
        Self {
            step: ManeuverStep::Braking,
            step_started: now,
            step_counter: 1,
            direction,
            turn_angle_deg: config.turn_angle_deg,
            reverse_speed: config.reverse_speed,
            pause: Duration::try_from_secs_f64(config.pause_s).unwrap_or(Duration::ZERO),
            reverse_duration: Duration::try_from_secs_f64(config.reverse_duration_s)
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Command for entering the Braking step
    pub fn initial_command() -> DriveCommand {
        DriveCommand::throttle(Throttle::Stop)
    }

    pub fn step(&self) -> ManeuverStep {
        self.step
    }

    pub fn step_counter(&self) -> u32 {
        self.step_counter
    }

    pub fn direction(&self) -> TurnDirection {
        self.direction
    }

    pub fn is_finished(&self) -> bool {
        self.step == ManeuverStep::Done
    }

    /// Steering angle used while reversing
    pub fn steer_angle_deg(&self) -> f64 {
        self.turn_angle_deg * self.direction.sign()
    }

    /// Advance by one tick.
    pub fn advance(&mut self, now: Instant) -> ManeuverUpdate {
        let elapsed = now.saturating_duration_since(self.step_started);

        let command = match self.step {
            ManeuverStep::Braking if elapsed >= self.pause => {
                self.enter(ManeuverStep::Reversing, now);
                Some(DriveCommand::new(
                    self.steer_angle_deg(),
                    Throttle::Backward(self.reverse_speed),
                ))
            }
            ManeuverStep::Reversing if elapsed >= self.reverse_duration => {
                self.enter(ManeuverStep::Done, now);
                Some(DriveCommand::halt())
            }
            _ => None,
        };

        ManeuverUpdate {
            command,
            finished: self.is_finished(),
        }
    }

    fn enter(&mut self, step: ManeuverStep, now: Instant) {
        tracing::debug!("Maneuver step {:?} -> {:?}", self.step, step);
        self.step = step;
        self.step_started = now;
        self.step_counter += 1;
    }
}
