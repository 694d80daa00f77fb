//! Simulated car configuration
//!
//! Every parameter has a default roughly matching a PiCar-X style kit, so an
//! empty `[device.simulation]` table gives a usable scene.
//!
//! ```text
//! SimulationConfig
//! ├── random_seed, fixed_step_ms      # Simulation control
//! ├── CarConfig                       # Kinematics and start pose
//! ├── UltrasonicConfig                # Beam width, range, noise, dropout
//! ├── CameraConfig                    # Frame size, FOV, detector noise
//! └── obstacles                       # Circular obstacles in the scene
//! ```
//!
//! World frame: centimeters, +x forward at start, +y to the left, heading in
//! degrees counter-clockwise.

use crate::types::ClassId;
use serde::{Deserialize, Serialize};

/// Car kinematics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarConfig {
    /// Front-to-rear axle distance (cm)
    #[serde(default = "default_wheelbase_cm")]
    pub wheelbase_cm: f64,

    /// Collision radius (cm)
    #[serde(default = "default_robot_radius_cm")]
    pub robot_radius_cm: f64,

    /// Ground speed per throttle unit (cm/s per 0-100 unit)
    #[serde(default = "default_cm_per_s_per_unit")]
    pub cm_per_s_per_unit: f64,

    /// Steering servo limit (degrees, symmetric)
    #[serde(default = "default_steer_limit_deg")]
    pub steer_limit_deg: f64,

    #[serde(default)]
    pub start_x_cm: f64,

    #[serde(default)]
    pub start_y_cm: f64,

    #[serde(default)]
    pub start_heading_deg: f64,
}

fn default_wheelbase_cm() -> f64 {
    14.0
}
fn default_robot_radius_cm() -> f64 {
    8.0
}
fn default_cm_per_s_per_unit() -> f64 {
    1.0
}
fn default_steer_limit_deg() -> f64 {
    30.0
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            wheelbase_cm: default_wheelbase_cm(),
            robot_radius_cm: default_robot_radius_cm(),
            cm_per_s_per_unit: default_cm_per_s_per_unit(),
            steer_limit_deg: default_steer_limit_deg(),
            start_x_cm: 0.0,
            start_y_cm: 0.0,
            start_heading_deg: 0.0,
        }
    }
}

/// Ultrasonic ranger model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UltrasonicConfig {
    /// Half-angle of the beam cone (degrees)
    #[serde(default = "default_beam_half_angle_deg")]
    pub beam_half_angle_deg: f64,

    /// Beyond this there is no echo (cm)
    #[serde(default = "default_max_range_cm")]
    pub max_range_cm: f64,

    /// Gaussian range noise (cm)
    #[serde(default = "default_range_stddev_cm")]
    pub noise_stddev_cm: f64,

    /// Probability of a missed echo per read (0.0-1.0)
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f64,
}

fn default_beam_half_angle_deg() -> f64 {
    15.0
}
fn default_max_range_cm() -> f64 {
    300.0
}
fn default_range_stddev_cm() -> f64 {
    0.5
}
fn default_dropout_rate() -> f64 {
    0.02
}

impl Default for UltrasonicConfig {
    fn default() -> Self {
        Self {
            beam_half_angle_deg: default_beam_half_angle_deg(),
            max_range_cm: default_max_range_cm(),
            noise_stddev_cm: default_range_stddev_cm(),
            dropout_rate: default_dropout_rate(),
        }
    }
}

/// Camera + detector model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// Real half horizontal field of view (degrees)
    #[serde(default = "default_camera_half_fov_deg")]
    pub half_fov_deg: f64,

    /// Objects farther than this are not detected (cm)
    #[serde(default = "default_detect_range_cm")]
    pub detect_range_cm: f64,

    /// Mean detector confidence for a visible object
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f32,

    /// Gaussian confidence noise
    #[serde(default = "default_confidence_stddev")]
    pub confidence_stddev: f32,

    /// Probability that no frame is ready on a poll (0.0-1.0)
    #[serde(default)]
    pub frame_drop_rate: f64,
}

fn default_frame_width() -> u32 {
    640
}
fn default_frame_height() -> u32 {
    480
}
fn default_camera_half_fov_deg() -> f64 {
    31.0
}
fn default_detect_range_cm() -> f64 {
    100.0
}
fn default_base_confidence() -> f32 {
    0.75
}
fn default_confidence_stddev() -> f32 {
    0.08
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            half_fov_deg: default_camera_half_fov_deg(),
            detect_range_cm: default_detect_range_cm(),
            base_confidence: default_base_confidence(),
            confidence_stddev: default_confidence_stddev(),
            frame_drop_rate: 0.0,
        }
    }
}

/// A circular obstacle standing on the floor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObstacleConfig {
    pub x_cm: f64,
    pub y_cm: f64,
    #[serde(default = "default_obstacle_radius_cm")]
    pub radius_cm: f64,
    #[serde(default = "default_obstacle_height_cm")]
    pub height_cm: f64,
    /// Detector class; `None` means the camera never detects it (e.g. a wall)
    #[serde(default)]
    pub class_id: Option<ClassId>,
}

fn default_obstacle_radius_cm() -> f64 {
    10.0
}
fn default_obstacle_height_cm() -> f64 {
    30.0
}

/// Complete simulation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// 0 = random each run
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Advance the world by a fixed step per range read instead of wall time
    #[serde(default)]
    pub fixed_step_ms: Option<u64>,

    #[serde(default)]
    pub car: CarConfig,

    #[serde(default)]
    pub ultrasonic: UltrasonicConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default = "default_obstacles")]
    pub obstacles: Vec<ObstacleConfig>,
}

fn default_random_seed() -> u64 {
    42
}

fn default_obstacles() -> Vec<ObstacleConfig> {
    vec![
        // A person standing in the lane
        ObstacleConfig {
            x_cm: 150.0,
            y_cm: 5.0,
            radius_cm: 12.0,
            height_cm: 60.0,
            class_id: Some(0),
        },
        // A box the detector does not know
        ObstacleConfig {
            x_cm: 320.0,
            y_cm: -20.0,
            radius_cm: 15.0,
            height_cm: 25.0,
            class_id: None,
        },
    ]
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_seed: default_random_seed(),
            fixed_step_ms: None,
            car: CarConfig::default(),
            ultrasonic: UltrasonicConfig::default(),
            camera: CameraConfig::default(),
            obstacles: default_obstacles(),
        }
    }
}

impl SimulationConfig {
    /// Reject parameters the sensor models cannot sample from
    pub fn validate(&self) -> Result<(), String> {
        let probabilities = [
            ("ultrasonic.dropout_rate", self.ultrasonic.dropout_rate),
            ("camera.frame_drop_rate", self.camera.frame_drop_rate),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} {} outside [0, 1]", name, p));
            }
        }

        let non_negative = [
            ("ultrasonic.noise_stddev_cm", self.ultrasonic.noise_stddev_cm),
            ("camera.confidence_stddev", self.camera.confidence_stddev as f64),
            ("car.cm_per_s_per_unit", self.car.cm_per_s_per_unit),
        ];
        for (name, v) in non_negative {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(format!("{} {} must be finite and non-negative", name, v));
            }
        }

        if !(self.car.wheelbase_cm > 0.0 && self.car.wheelbase_cm.is_finite()) {
            return Err(format!("car.wheelbase_cm {} must be positive", self.car.wheelbase_cm));
        }
        if !(self.camera.half_fov_deg > 0.0 && self.camera.half_fov_deg < 90.0) {
            return Err(format!(
                "camera.half_fov_deg {} outside (0, 90)",
                self.camera.half_fov_deg
            ));
        }
        if self.fixed_step_ms == Some(0) {
            return Err("fixed_step_ms must be non-zero when set".to_string());
        }
        Ok(())
    }

    /// Noise-free, deterministic scene with the given obstacles
    pub fn noiseless(obstacles: Vec<ObstacleConfig>) -> Self {
        Self {
            random_seed: 1,
            fixed_step_ms: Some(50),
            ultrasonic: UltrasonicConfig {
                noise_stddev_cm: 0.0,
                dropout_rate: 0.0,
                ..UltrasonicConfig::default()
            },
            camera: CameraConfig {
                confidence_stddev: 0.0,
                frame_drop_rate: 0.0,
                ..CameraConfig::default()
            },
            obstacles,
            ..Self::default()
        }
    }
}
