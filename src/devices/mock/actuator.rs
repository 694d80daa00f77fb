//! Recording actuator for the simulated car

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::world::SimWorld;
use crate::drivers::ActuatorPort;
use crate::error::{KavachError, Result};

/// One call made on the actuator, in call order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Steer(f64),
    Forward(u8),
    Backward(u8),
    Stop,
}

#[derive(Default)]
struct CallLog {
    calls: Vec<ActuatorCall>,
    fail_remaining: u32,
}

/// Actuator that records every call and optionally drives a [`SimWorld`].
///
/// Clones share the same log, so a test can keep a handle after moving the
/// actuator into a controller. Failed calls are still recorded.
#[derive(Clone)]
pub struct MockActuator {
    log: Arc<Mutex<CallLog>>,
    world: Option<Arc<Mutex<SimWorld>>>,
}

impl MockActuator {
    /// Log-only actuator, not attached to any world
    pub fn recording() -> Self {
        Self {
            log: Arc::new(Mutex::new(CallLog::default())),
            world: None,
        }
    }

    /// Actuator that also moves the simulated car
    pub fn attached(world: Arc<Mutex<SimWorld>>) -> Self {
        Self {
            world: Some(world),
            ..Self::recording()
        }
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.log.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.log.lock().calls.clear();
    }

    /// Make the next `n` calls fail with an actuator error
    pub fn fail_next(&self, n: u32) {
        self.log.lock().fail_remaining = n;
    }

    fn record(&mut self, call: ActuatorCall) -> Result<()> {
        {
            let mut log = self.log.lock();
            log.calls.push(call);
            if log.fail_remaining > 0 {
                log.fail_remaining -= 1;
                return Err(KavachError::Actuator(format!("simulated failure on {call:?}")));
            }
        }

        trace!("Mock actuator: {:?}", call);
        if let Some(world) = &self.world {
            let mut world = world.lock();
            match call {
                ActuatorCall::Steer(deg) => world.set_steering(deg),
                ActuatorCall::Forward(speed) => world.set_throttle(speed as f64),
                ActuatorCall::Backward(speed) => world.set_throttle(-(speed as f64)),
                ActuatorCall::Stop => world.set_throttle(0.0),
            }
        }
        Ok(())
    }
}

impl ActuatorPort for MockActuator {
    fn set_steering_angle(&mut self, deg: f64) -> Result<()> {
        self.record(ActuatorCall::Steer(deg))
    }

    fn drive_forward(&mut self, speed: u8) -> Result<()> {
        self.record(ActuatorCall::Forward(speed))
    }

    fn drive_backward(&mut self, speed: u8) -> Result<()> {
        self.record(ActuatorCall::Backward(speed))
    }

    fn stop(&mut self) -> Result<()> {
        self.record(ActuatorCall::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::SimulationConfig;

    #[test]
    fn test_clones_share_the_log() {
        let handle = MockActuator::recording();
        let mut act = handle.clone();

        act.set_steering_angle(-12.5).unwrap();
        act.drive_forward(40).unwrap();
        act.stop().unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                ActuatorCall::Steer(-12.5),
                ActuatorCall::Forward(40),
                ActuatorCall::Stop
            ]
        );
        handle.clear();
        assert!(act.calls().is_empty());
    }

    #[test]
    fn test_injected_failures_run_out() {
        let mut act = MockActuator::recording();
        act.fail_next(2);

        assert!(act.stop().is_err());
        assert!(act.drive_backward(10).is_err());
        assert!(act.stop().is_ok());
        assert_eq!(act.calls().len(), 3);
    }

    #[test]
    fn test_attached_actuator_moves_the_world() {
        let world = Arc::new(Mutex::new(SimWorld::new(SimulationConfig::noiseless(vec![]))));
        let mut act = MockActuator::attached(world.clone());

        act.set_steering_angle(10.0).unwrap();
        act.drive_backward(20).unwrap();
        assert_eq!(world.lock().steering_deg(), 10.0);
        assert_eq!(world.lock().throttle(), -20.0);

        act.stop().unwrap();
        assert_eq!(world.lock().throttle(), 0.0);
    }

    #[test]
    fn test_failed_call_leaves_world_untouched() {
        let world = Arc::new(Mutex::new(SimWorld::new(SimulationConfig::noiseless(vec![]))));
        let mut act = MockActuator::attached(world.clone());
        act.fail_next(1);

        assert!(act.drive_forward(50).is_err());
        assert_eq!(world.lock().throttle(), 0.0);
    }
}
