//! Avoidance controller: owns every piece of state carried between ticks.
//!
//! One [`AvoidanceController::tick`] consumes the fused zone and issues at
//! most one composite command (steer, then throttle). The only memory kept
//! across avoidance episodes is the alternating turn direction, which flips
//! exactly once per completed maneuver.

use std::time::Instant;

use crate::config::{DriveConfig, EvasionConfig, KavachConfig};
use crate::drivers::{ActuatorPort, DriveCommand, Throttle};
use crate::error::{KavachError, Result};
use crate::types::{Motion, TurnDirection, Zone};

use super::maneuver::EvasiveManeuver;
use super::state::{DriveState, steady_command, transition};

/// State-machine fields restored when a tick's command fails
struct Checkpoint {
    state: DriveState,
    maneuver: Option<EvasiveManeuver>,
    last_turn_dir: TurnDirection,
    maneuvers_completed: u64,
}

/// Reactive avoidance state machine bound to one actuator.
pub struct AvoidanceController<A: ActuatorPort> {
    actuator: A,
    drive: DriveConfig,
    evasion: EvasionConfig,
    state: DriveState,
    maneuver: Option<EvasiveManeuver>,
    last_turn_dir: TurnDirection,
    motion: Motion,
    steering_angle_deg: f64,
    maneuvers_completed: u64,
    shut_down: bool,
}

impl<A: ActuatorPort> AvoidanceController<A> {
    /// Create a controller, rejecting unsafe configuration before any tick.
    pub fn new(config: &KavachConfig, actuator: A) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            "AvoidanceController: cruise={} caution={} turn=±{:.0}° reverse={}@{:.2}s",
            config.drive.cruise_speed,
            config.drive.caution_speed,
            config.evasion.turn_angle_deg,
            config.evasion.reverse_speed,
            config.evasion.reverse_duration_s
        );

        Ok(Self {
            actuator,
            drive: config.drive.clone(),
            evasion: config.evasion.clone(),
            state: DriveState::Cruise,
            maneuver: None,
            last_turn_dir: TurnDirection::Right,
            motion: Motion::Stopped,
            steering_angle_deg: 0.0,
            maneuvers_completed: 0,
            shut_down: false,
        })
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Direction the next maneuver will steer toward
    pub fn last_turn_dir(&self) -> TurnDirection {
        self.last_turn_dir
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn steering_angle_deg(&self) -> f64 {
        self.steering_angle_deg
    }

    pub fn maneuver(&self) -> Option<&EvasiveManeuver> {
        self.maneuver.as_ref()
    }

    pub fn maneuvers_completed(&self) -> u64 {
        self.maneuvers_completed
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Run one state-machine step for `zone` at time `now`.
    ///
    /// Returns the command that was dispatched, if any. On actuator failure a
    /// single `stop()` retry is attempted, the state machine is restored to
    /// where it was before this tick, and the failure is returned. A maneuver
    /// step therefore only counts once its command has been delivered.
    pub fn tick(&mut self, zone: Zone, now: Instant) -> Result<Option<DriveCommand>> {
        if self.shut_down {
            tracing::warn!("tick() after shutdown ignored");
            return Ok(None);
        }

        let previous = self.state;
        let saved = Checkpoint {
            state: self.state,
            maneuver: self.maneuver.clone(),
            last_turn_dir: self.last_turn_dir,
            maneuvers_completed: self.maneuvers_completed,
        };
        let command = match self.state {
            DriveState::Evading => self.step_maneuver(zone, now),
            DriveState::Cruise | DriveState::CautionDrive => {
                let next = transition(self.state, zone, false);
                self.state = next;
                if next == DriveState::Evading {
                    self.begin_maneuver(now);
                    Some(EvasiveManeuver::initial_command())
                } else {
                    steady_command(next, &self.drive)
                }
            }
        };

        if let Some(cmd) = command
            && let Err(e) = self.dispatch(cmd)
        {
            self.restore(saved);
            return Err(e);
        }

        if self.state != previous {
            tracing::info!("{} -> {} (zone {})", previous, self.state, zone);
        }
        Ok(command)
    }

    /// Stop and center steering, abandoning any maneuver in progress.
    ///
    /// Both calls are attempted even if one fails; a failed stop is retried
    /// once. Later ticks are ignored.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(m) = self.maneuver.take() {
            tracing::info!("Shutdown aborts maneuver at step {:?}", m.step());
        }
        self.shut_down = true;
        self.state = DriveState::Cruise;

        let stop_result = self.stop_with_retry();
        let steer_result = self.actuator.set_steering_angle(0.0);
        if steer_result.is_ok() {
            self.steering_angle_deg = 0.0;
        }

        match (stop_result, steer_result) {
            (Ok(()), Ok(())) => {
                tracing::info!("Controller shut down: stopped, steering centered");
                Ok(())
            }
            (Err(e), _) | (Ok(()), Err(e)) => {
                tracing::error!("Shutdown incomplete: {}", e);
                Err(KavachError::Actuator(format!("shutdown: {}", e)))
            }
        }
    }

    fn restore(&mut self, saved: Checkpoint) {
        tracing::warn!(
            "Command not delivered, staying in {} ({:?})",
            saved.state,
            saved.maneuver.as_ref().map(|m| m.step())
        );
        self.state = saved.state;
        self.maneuver = saved.maneuver;
        self.last_turn_dir = saved.last_turn_dir;
        self.maneuvers_completed = saved.maneuvers_completed;
    }

    fn begin_maneuver(&mut self, now: Instant) {
        tracing::info!(
            "Evasive maneuver: reversing {} at {}° for {:.2}s",
            self.last_turn_dir,
            self.evasion.turn_angle_deg,
            self.evasion.reverse_duration_s
        );
        self.maneuver = Some(EvasiveManeuver::start(now, self.last_turn_dir, &self.evasion));
    }

    fn step_maneuver(&mut self, zone: Zone, now: Instant) -> Option<DriveCommand> {
        let Some(maneuver) = self.maneuver.as_mut() else {
            // Evading without a maneuver cannot normally happen; restart one
            self.begin_maneuver(now);
            return Some(EvasiveManeuver::initial_command());
        };

        let update = maneuver.advance(now);
        if !update.finished {
            return update.command;
        }

        self.maneuver = None;
        self.last_turn_dir = self.last_turn_dir.flipped();
        self.maneuvers_completed += 1;
        tracing::info!(
            "Maneuver complete (#{}), next turn {}",
            self.maneuvers_completed,
            self.last_turn_dir
        );

        self.state = transition(DriveState::Evading, zone, true);
        if self.state == DriveState::Evading {
            // The completion halt already satisfies the new maneuver's stop
            self.begin_maneuver(now);
        }
        update.command
    }

    fn dispatch(&mut self, cmd: DriveCommand) -> Result<()> {
        if let Err(e) = self.apply(cmd) {
            tracing::error!("Actuator failed on '{}': {}", cmd, e);
            if let Err(stop_err) = self.actuator.stop() {
                tracing::error!("Stop retry failed: {}", stop_err);
            } else {
                self.motion = Motion::Stopped;
            }
            return Err(KavachError::Actuator(format!("{}: {}", cmd, e)));
        }
        Ok(())
    }

    fn apply(&mut self, cmd: DriveCommand) -> Result<()> {
        if let Some(deg) = cmd.steer_deg {
            self.actuator.set_steering_angle(deg)?;
            self.steering_angle_deg = deg;
        }
        match cmd.throttle {
            Throttle::Forward(speed) => {
                self.actuator.drive_forward(speed)?;
                self.motion = Motion::Forward(speed);
            }
            Throttle::Backward(speed) => {
                self.actuator.drive_backward(speed)?;
                self.motion = Motion::Backward(speed);
            }
            Throttle::Stop => {
                self.actuator.stop()?;
                self.motion = Motion::Stopped;
            }
        }
        Ok(())
    }

    fn stop_with_retry(&mut self) -> Result<()> {
        match self.actuator.stop() {
            Ok(()) => {
                self.motion = Motion::Stopped;
                Ok(())
            }
            Err(first) => {
                tracing::warn!("Stop failed ({}), retrying once", first);
                self.actuator.stop()?;
                self.motion = Motion::Stopped;
                Ok(())
            }
        }
    }
}
