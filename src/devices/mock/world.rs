//! Simulated scene: car kinematics, collisions, and sensor geometry
//!
//! The car is a kinematic bicycle. Steering follows the actuator convention
//! (right positive), so a positive steering angle turns the heading clockwise.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::config::{ObstacleConfig, SimulationConfig};
use super::noise::SensorNoise;
use crate::drivers::SensorError;
use crate::types::{BoundingBox, Detection, DetectionSet};

/// Integration substep (seconds)
const MAX_SUBSTEP_S: f64 = 0.01;

/// HC-SR04 style blind zone; nearer surfaces read as this value
const MIN_ECHO_CM: f64 = 2.0;

/// Car pose in the world frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x_cm: f64,
    pub y_cm: f64,
    /// Counter-clockwise from +x (degrees)
    pub heading_deg: f64,
}

/// Obstacle position relative to the car
struct RelativePosition {
    /// Along the heading (cm)
    forward: f64,
    /// Positive to the right (cm)
    right: f64,
    /// Center-to-center distance (cm)
    range: f64,
}

/// Shared state behind the mock actuator, ranger and camera
pub struct SimWorld {
    config: SimulationConfig,
    x: f64,
    y: f64,
    /// Radians, CCW from +x
    theta: f64,
    /// Commanded steering (degrees, right positive, clamped to servo limit)
    steer_deg: f64,
    /// Signed throttle in 0-100 units, negative when reversing
    throttle: f64,
    noise: SensorNoise,
    collisions: u32,
    in_contact: bool,
    last_advance: Option<Instant>,
    sim_time: Duration,
}

impl SimWorld {
    pub fn new(config: SimulationConfig) -> Self {
        let noise = SensorNoise::new(config.random_seed);
        Self {
            x: config.car.start_x_cm,
            y: config.car.start_y_cm,
            theta: normalize_angle(config.car.start_heading_deg.to_radians()),
            steer_deg: 0.0,
            throttle: 0.0,
            noise,
            collisions: 0,
            in_contact: false,
            last_advance: None,
            sim_time: Duration::ZERO,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x_cm: self.x,
            y_cm: self.y,
            heading_deg: self.theta.to_degrees(),
        }
    }

    pub fn steering_deg(&self) -> f64 {
        self.steer_deg
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    /// Number of distinct times the car ran into something
    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    pub fn set_steering(&mut self, deg: f64) {
        let limit = self.config.car.steer_limit_deg.abs();
        self.steer_deg = deg.clamp(-limit, limit);
    }

    /// Signed throttle in 0-100 units
    pub fn set_throttle(&mut self, units: f64) {
        self.throttle = units.clamp(-100.0, 100.0);
    }

    /// Move the clock forward by one fixed step, or by the wall time since the
    /// previous call when no fixed step is configured.
    pub fn advance(&mut self) {
        let dt = match self.config.fixed_step_ms {
            Some(ms) => Duration::from_millis(ms),
            None => {
                let now = Instant::now();
                let dt = self
                    .last_advance
                    .map_or(Duration::ZERO, |last| now.duration_since(last));
                self.last_advance = Some(now);
                dt
            }
        };
        self.step(dt);
    }

    /// Integrate car motion over `dt`
    pub fn step(&mut self, dt: Duration) {
        self.sim_time += dt;
        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP_S);
            self.substep(h);
            remaining -= h;
        }
    }

    fn substep(&mut self, dt: f64) {
        let v = self.throttle * self.config.car.cm_per_s_per_unit;
        if v == 0.0 {
            return;
        }

        let wheelbase = self.config.car.wheelbase_cm.max(1.0);
        let omega = -v / wheelbase * self.steer_deg.to_radians().tan();

        let new_theta = self.theta + omega * dt;
        let mid = self.theta + 0.5 * omega * dt;
        let new_x = self.x + v * mid.cos() * dt;
        let new_y = self.y + v * mid.sin() * dt;

        if self.would_collide(new_x, new_y) {
            // Stop mode: wheels spin, the car stays put
            if !self.in_contact {
                self.collisions += 1;
                warn!(
                    "Simulated collision #{} at ({:.1}, {:.1})",
                    self.collisions, self.x, self.y
                );
            }
            self.in_contact = true;
            return;
        }

        self.in_contact = false;
        self.x = new_x;
        self.y = new_y;
        self.theta = normalize_angle(new_theta);
    }

    fn would_collide(&self, x: f64, y: f64) -> bool {
        let r = self.config.car.robot_radius_cm;
        self.config
            .obstacles
            .iter()
            .any(|o| (o.x_cm - x).hypot(o.y_cm - y) < o.radius_cm + r)
    }

    fn relative(&self, obstacle: &ObstacleConfig) -> RelativePosition {
        let dx = obstacle.x_cm - self.x;
        let dy = obstacle.y_cm - self.y;
        let (sin, cos) = self.theta.sin_cos();
        RelativePosition {
            forward: dx * cos + dy * sin,
            right: dx * sin - dy * cos,
            range: dx.hypot(dy),
        }
    }

    /// Distance from the front bumper to the nearest surface inside the beam
    fn nearest_echo_cm(&self) -> Option<f64> {
        let beam = self.config.ultrasonic.beam_half_angle_deg.to_radians();
        let bumper = self.config.car.robot_radius_cm;

        self.config
            .obstacles
            .iter()
            .filter_map(|o| {
                let rel = self.relative(o);
                if rel.forward <= 0.0 {
                    return None;
                }
                let bearing = rel.right.atan2(rel.forward).abs();
                let angular_half_width = (o.radius_cm / rel.range).min(1.0).asin();
                (bearing <= beam + angular_half_width)
                    .then(|| (rel.range - o.radius_cm - bumper).max(MIN_ECHO_CM))
            })
            .min_by(|a, b| a.total_cmp(b))
    }

    /// One ultrasonic ping
    pub fn ping(&mut self) -> std::result::Result<f64, SensorError> {
        let us = &self.config.ultrasonic;
        let (max_range, stddev, dropout) = (us.max_range_cm, us.noise_stddev_cm, us.dropout_rate);

        if self.noise.happens(dropout) {
            return Err(SensorError::NoEcho);
        }

        let distance = self.nearest_echo_cm().ok_or(SensorError::NoEcho)?;
        if distance > max_range {
            return Err(SensorError::OutOfRange(distance));
        }

        Ok((distance + self.noise.gaussian(stddev)).max(MIN_ECHO_CM))
    }

    /// One detector frame, or `None` when the frame was dropped
    pub fn capture(&mut self) -> Option<DetectionSet> {
        let cam = self.config.camera.clone();
        if self.noise.happens(cam.frame_drop_rate) {
            debug!("Simulated camera dropped a frame");
            return None;
        }

        let (w, h) = (cam.frame_width as f64, cam.frame_height as f64);
        let half_fov = cam.half_fov_deg.to_radians();
        let focal = (w / 2.0) / half_fov.tan();
        let mut frame = DetectionSet::new(cam.frame_width, cam.frame_height);

        for obstacle in &self.config.obstacles {
            let Some(class_id) = obstacle.class_id else {
                continue;
            };
            let rel = self.relative(obstacle);
            if rel.forward <= 1.0 || rel.range - obstacle.radius_cm > cam.detect_range_cm {
                continue;
            }
            if rel.right.atan2(rel.forward).abs() > half_fov {
                continue;
            }

            let cx = w / 2.0 + focal * rel.right / rel.forward;
            let half_w = focal * obstacle.radius_cm / rel.forward;
            let half_h = 0.5 * focal * obstacle.height_cm / rel.forward;
            let (cy, top) = (h / 2.0, h / 2.0 - half_h);
            let bbox = BoundingBox::new(cx - half_w, top, cx + half_w, cy + half_h).clamped(w, h);

            let confidence = (cam.base_confidence as f64
                + self.noise.gaussian(cam.confidence_stddev as f64))
            .clamp(0.0, 1.0) as f32;

            frame.push(Detection::new(class_id, confidence, bbox));
        }

        Some(frame)
    }
}

/// Wrap to [-π, π)
fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}
