//! Actuator driver trait and composite drive commands

use std::fmt;

use crate::error::Result;

/// Steering and throttle actuator.
///
/// Calls are fire-and-forget and must be fast enough to issue back-to-back
/// within one tick. The implementation clamps steering to its own hardware
/// limits; speeds are in abstract 0-100 units.
pub trait ActuatorPort {
    /// Steering angle in degrees, left negative / right positive
    fn set_steering_angle(&mut self, deg: f64) -> Result<()>;

    fn drive_forward(&mut self, speed: u8) -> Result<()>;

    fn drive_backward(&mut self, speed: u8) -> Result<()>;

    fn stop(&mut self) -> Result<()>;
}

impl<A: ActuatorPort + ?Sized> ActuatorPort for Box<A> {
    fn set_steering_angle(&mut self, deg: f64) -> Result<()> {
        (**self).set_steering_angle(deg)
    }

    fn drive_forward(&mut self, speed: u8) -> Result<()> {
        (**self).drive_forward(speed)
    }

    fn drive_backward(&mut self, speed: u8) -> Result<()> {
        (**self).drive_backward(speed)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}

/// Throttle half of a composite command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Forward(u8),
    Backward(u8),
    Stop,
}

/// One tick's actuator batch: optional steering, then throttle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCommand {
    pub steer_deg: Option<f64>,
    pub throttle: Throttle,
}

impl DriveCommand {
    pub fn new(steer_deg: f64, throttle: Throttle) -> Self {
        Self {
            steer_deg: Some(steer_deg),
            throttle,
        }
    }

    /// Throttle only, steering left where it is
    pub fn throttle(throttle: Throttle) -> Self {
        Self {
            steer_deg: None,
            throttle,
        }
    }

    /// Stop with steering re-centered
    pub fn halt() -> Self {
        Self::new(0.0, Throttle::Stop)
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(deg) = self.steer_deg {
            write!(f, "steer {:+.0}° + ", deg)?;
        }
        match self.throttle {
            Throttle::Forward(speed) => write!(f, "forward {}", speed),
            Throttle::Backward(speed) => write!(f, "backward {}", speed),
            Throttle::Stop => f.write_str("stop"),
        }
    }
}
