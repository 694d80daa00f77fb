//! Control loop: sensors in, one avoidance step, actuator out.
//!
//! ```text
//! every tick_interval_ms:
//!   range  = read ultrasonic (fail-open)
//!   frame  = newest detector frame, or the last one while still fresh
//!   ahead  = VisionObstacleFilter(frame)
//!   target = TargetBearingEstimator(frame)
//!   zone   = ObstacleFusion(ahead, range)
//!   cmd    = AvoidanceController::tick(zone)      (skipped in monitor mode)
//! ```
//!
//! The loop always ends with [`AvoidanceController::shutdown`], whether it
//! stopped on the running flag, the tick limit, or an actuator failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::config::{ControlMode, KavachConfig};
use crate::control::{AvoidanceController, DriveState};
use crate::devices::Device;
use crate::drivers::{ActuatorPort, DetectionSource, DriveCommand, RangeSensor, read_range};
use crate::error::Result;
use crate::perception::{ObstacleFusion, TargetBearingEstimator, VisionObstacleFilter};
use crate::types::{DetectionSet, RangeReading, TargetState, Zone};

/// Everything decided during one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub zone: Zone,
    /// Controller state after the tick
    pub state: DriveState,
    pub range: RangeReading,
    pub vision_obstacle: bool,
    pub target: TargetState,
    /// Command dispatched this tick, if any
    pub command: Option<DriveCommand>,
}

/// Control loop over boxed device drivers
pub type DeviceLoop = ControlLoop<
    Box<dyn ActuatorPort + Send>,
    Box<dyn RangeSensor + Send>,
    Box<dyn DetectionSource + Send>,
>;

pub struct ControlLoop<A: ActuatorPort, R: RangeSensor, V: DetectionSource> {
    controller: AvoidanceController<A>,
    vision: VisionObstacleFilter,
    bearing: TargetBearingEstimator,
    fusion: ObstacleFusion,
    range_sensor: R,
    camera: V,
    mode: ControlMode,
    tick_interval: Duration,
    max_frame_age: Duration,
    /// Last detector frame and when it arrived
    last_frame: Option<(DetectionSet, Instant)>,
    ticks: u64,
}

impl DeviceLoop {
    pub fn from_device(config: &KavachConfig, device: Device) -> Result<Self> {
        Self::new(config, device.actuator, device.range_sensor, device.camera)
    }
}

impl<A: ActuatorPort, R: RangeSensor, V: DetectionSource> ControlLoop<A, R, V> {
    pub fn new(config: &KavachConfig, actuator: A, range_sensor: R, camera: V) -> Result<Self> {
        let controller = AvoidanceController::new(config, actuator)?;
        let fusion = ObstacleFusion::from_config(&config.zones)?;

        info!(
            "Control loop: mode={:?} tick={}ms zones danger<{}cm caution<{}cm",
            config.control.mode,
            config.control.tick_interval_ms,
            config.zones.danger_cm,
            config.zones.caution_cm
        );

        Ok(Self {
            controller,
            vision: VisionObstacleFilter::from_config(&config.perception),
            bearing: TargetBearingEstimator::from_config(&config.perception),
            fusion,
            range_sensor,
            camera,
            mode: config.control.mode,
            tick_interval: Duration::from_millis(config.control.tick_interval_ms),
            max_frame_age: Duration::from_millis(config.control.max_frame_age_ms),
            last_frame: None,
            ticks: 0,
        })
    }

    pub fn controller(&self) -> &AvoidanceController<A> {
        &self.controller
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Latest target estimate
    pub fn target(&self) -> &TargetState {
        self.bearing.state()
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self) -> Result<TickReport> {
        self.tick_at(Instant::now())
    }

    /// Run one tick with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant) -> Result<TickReport> {
        self.ticks += 1;
        let range = read_range(&mut self.range_sensor);

        let (vision_obstacle, target) = if self.mode == ControlMode::UltrasonicOnly {
            (false, TargetState::none())
        } else {
            self.refresh_frame(now);
            let empty = DetectionSet::default();
            let frame = self.last_frame.as_ref().map_or(&empty, |(f, _)| f);
            (self.vision.check(frame), self.bearing.update_from(frame))
        };

        let zone = self.fusion.classify(vision_obstacle, range);

        let command = match self.mode {
            ControlMode::Monitor => {
                self.log_monitor(range, &target);
                None
            }
            ControlMode::Fused | ControlMode::UltrasonicOnly => self.controller.tick(zone, now)?,
        };

        let report = TickReport {
            zone,
            state: self.controller.state(),
            range,
            vision_obstacle,
            target,
            command,
        };
        debug!(
            "tick {}: zone={} state={} range={:?} ahead={} cmd={:?}",
            self.ticks,
            report.zone,
            report.state,
            report.range.distance(),
            report.vision_obstacle,
            report.command
        );
        Ok(report)
    }

    /// Tick until `running` clears or `max_ticks` is reached, then shut down.
    ///
    /// Returns the number of ticks run. An actuator failure ends the loop
    /// after a shutdown attempt and is returned as the error.
    pub fn run(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<u64> {
        info!("Control loop running in {:?} mode", self.mode);

        let outcome = loop {
            if !running.load(Ordering::Relaxed) {
                info!("Stop requested");
                break Ok(());
            }
            if max_ticks.is_some_and(|max| self.ticks >= max) {
                info!("Reached tick limit ({})", self.ticks);
                break Ok(());
            }

            let started = Instant::now();
            if let Err(e) = self.tick_at(started) {
                error!("Tick {} failed: {}", self.ticks, e);
                break Err(e);
            }
            std::thread::sleep(self.tick_interval.saturating_sub(started.elapsed()));
        };

        let shutdown = self.controller.shutdown();
        info!(
            "Control loop finished after {} ticks, {} maneuver(s)",
            self.ticks,
            self.controller.maneuvers_completed()
        );
        outcome?;
        shutdown?;
        Ok(self.ticks)
    }

    fn refresh_frame(&mut self, now: Instant) {
        if let Some(frame) = self.camera.poll_detections() {
            self.last_frame = Some((frame, now));
            return;
        }

        if let Some((_, at)) = &self.last_frame
            && now.saturating_duration_since(*at) > self.max_frame_age
        {
            debug!("Detector frame expired, treating camera as clear");
            self.last_frame = None;
        }
    }

    fn log_monitor(&self, range: RangeReading, target: &TargetState) {
        let best = self.last_frame.as_ref().and_then(|(f, _)| f.best());
        let distance = range
            .distance()
            .map_or_else(|| "--".to_string(), |d| format!("{d:.1}cm"));
        match best {
            Some(d) => info!(
                "dist={} best class={} conf={:.2} center_x={:.0} | {}",
                distance,
                d.class_id,
                d.confidence,
                d.bbox.center_x(),
                target
            ),
            None => info!("dist={} no detections", distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ManeuverStep;
    use crate::devices::mock::{ActuatorCall, MockActuator};
    use crate::drivers::SensorError;
    use crate::types::{BoundingBox, Detection};
    use std::collections::VecDeque;

    struct ScriptedRange(VecDeque<std::result::Result<f64, SensorError>>);

    impl RangeSensor for ScriptedRange {
        fn read_distance_cm(&mut self) -> std::result::Result<f64, SensorError> {
            self.0.pop_front().unwrap_or(Err(SensorError::NoEcho))
        }
    }

    struct ScriptedCamera(VecDeque<Option<DetectionSet>>);

    impl DetectionSource for ScriptedCamera {
        fn poll_detections(&mut self) -> Option<DetectionSet> {
            self.0.pop_front().flatten()
        }
    }

    fn person_at(center_x: f64) -> DetectionSet {
        DetectionSet::with_detections(
            640,
            480,
            vec![Detection::new(
                0,
                0.9,
                BoundingBox::new(center_x - 40.0, 100.0, center_x + 40.0, 400.0),
            )],
        )
    }

    fn build(
        mode: ControlMode,
        ranges: Vec<std::result::Result<f64, SensorError>>,
        frames: Vec<Option<DetectionSet>>,
    ) -> (ControlLoop<MockActuator, ScriptedRange, ScriptedCamera>, MockActuator) {
        let mut config = KavachConfig::default();
        config.control.mode = mode;
        let actuator = MockActuator::recording();
        let handle = actuator.clone();
        let ctl = ControlLoop::new(
            &config,
            actuator,
            ScriptedRange(ranges.into()),
            ScriptedCamera(frames.into()),
        )
        .unwrap();
        (ctl, handle)
    }

    #[test]
    fn test_clear_road_cruises() {
        let (mut ctl, act) = build(
            ControlMode::Fused,
            vec![Ok(200.0)],
            vec![Some(DetectionSet::new(640, 480))],
        );

        let report = ctl.tick_at(Instant::now()).unwrap();
        assert_eq!(report.zone, Zone::Safe);
        assert_eq!(report.state, DriveState::Cruise);
        assert!(!report.target.has_target);
        assert_eq!(act.calls(), vec![ActuatorCall::Steer(0.0), ActuatorCall::Forward(25)]);
    }

    #[test]
    fn test_centered_detection_triggers_evasion_at_long_range() {
        let (mut ctl, act) = build(
            ControlMode::Fused,
            vec![Ok(200.0)],
            vec![Some(person_at(320.0))],
        );

        let report = ctl.tick_at(Instant::now()).unwrap();
        assert!(report.vision_obstacle);
        assert_eq!(report.zone, Zone::Danger);
        assert_eq!(report.state, DriveState::Evading);
        assert!(report.target.has_target);
        assert_eq!(act.calls(), vec![ActuatorCall::Stop]);
    }

    #[test]
    fn test_ultrasonic_only_ignores_the_camera() {
        let (mut ctl, act) = build(
            ControlMode::UltrasonicOnly,
            vec![Ok(200.0)],
            vec![Some(person_at(320.0))],
        );

        let report = ctl.tick_at(Instant::now()).unwrap();
        assert!(!report.vision_obstacle);
        assert_eq!(report.zone, Zone::Safe);
        assert!(!ctl.target().has_target);
        assert_eq!(act.calls(), vec![ActuatorCall::Steer(0.0), ActuatorCall::Forward(25)]);
    }

    #[test]
    fn test_monitor_mode_never_moves() {
        let (mut ctl, act) = build(
            ControlMode::Monitor,
            vec![Ok(10.0), Ok(40.0)],
            vec![Some(person_at(320.0)), None],
        );

        let t0 = Instant::now();
        let report = ctl.tick_at(t0).unwrap();
        assert_eq!(report.zone, Zone::Danger);
        assert!(report.command.is_none());
        ctl.tick_at(t0 + Duration::from_millis(50)).unwrap();
        assert!(act.calls().is_empty());
    }

    #[test]
    fn test_failed_range_read_is_far() {
        let (mut ctl, _act) = build(
            ControlMode::Fused,
            vec![Err(SensorError::Disconnected("echo pin".to_string()))],
            vec![None],
        );

        let report = ctl.tick_at(Instant::now()).unwrap();
        assert!(!report.range.valid);
        assert_eq!(report.zone, Zone::Safe);
    }

    #[test]
    fn test_missing_frame_reuses_last_until_it_expires() {
        let (mut ctl, _act) = build(
            ControlMode::Monitor,
            vec![],
            vec![Some(person_at(320.0)), None, None],
        );

        let t0 = Instant::now();
        assert!(ctl.tick_at(t0).unwrap().vision_obstacle);
        // Within max_frame_age_ms
        assert!(ctl.tick_at(t0 + Duration::from_millis(400)).unwrap().vision_obstacle);
        // Past it
        let stale = ctl.tick_at(t0 + Duration::from_millis(600)).unwrap();
        assert!(!stale.vision_obstacle);
        assert!(!stale.target.has_target);
    }

    #[test]
    fn test_maneuver_runs_across_ticks() {
        let ranges = vec![Ok(10.0), Ok(10.0), Ok(10.0), Ok(80.0)];
        let (mut ctl, act) = build(ControlMode::UltrasonicOnly, ranges, vec![]);

        let t0 = Instant::now();
        ctl.tick_at(t0).unwrap();
        assert_eq!(
            ctl.controller().maneuver().map(|m| m.step()),
            Some(ManeuverStep::Braking)
        );

        ctl.tick_at(t0 + Duration::from_millis(150)).unwrap();
        assert_eq!(
            ctl.controller().maneuver().map(|m| m.step()),
            Some(ManeuverStep::Reversing)
        );

        // Reversing still in progress
        let mid = ctl.tick_at(t0 + Duration::from_millis(300)).unwrap();
        assert!(mid.command.is_none());

        let done = ctl.tick_at(t0 + Duration::from_millis(700)).unwrap();
        assert_eq!(done.state, DriveState::Cruise);
        assert_eq!(ctl.controller().maneuvers_completed(), 1);
        assert_eq!(
            act.calls(),
            vec![
                ActuatorCall::Stop,
                ActuatorCall::Steer(25.0),
                ActuatorCall::Backward(15),
                ActuatorCall::Steer(0.0),
                ActuatorCall::Stop,
            ]
        );
    }

    #[test]
    fn test_run_honours_tick_limit_and_shuts_down() {
        let (mut ctl, act) = build(ControlMode::Fused, vec![Ok(200.0); 3], vec![]);
        let running = AtomicBool::new(true);

        assert_eq!(ctl.run(&running, Some(3)).unwrap(), 3);
        let calls = act.calls();
        assert_eq!(calls[calls.len() - 2..], [ActuatorCall::Stop, ActuatorCall::Steer(0.0)]);
        assert!(ctl.controller().is_shut_down());
    }

    #[test]
    fn test_run_returns_immediately_when_not_running() {
        let (mut ctl, act) = build(ControlMode::Fused, vec![], vec![]);
        let running = AtomicBool::new(false);

        assert_eq!(ctl.run(&running, None).unwrap(), 0);
        assert_eq!(act.calls(), vec![ActuatorCall::Stop, ActuatorCall::Steer(0.0)]);
    }
}
