//! Configuration loading for Kavach
//!
//! Every field has a default, so a partial TOML file (or none at all) is a
//! valid configuration. [`KavachConfig::validate`] rejects unsafe combinations
//! before the controller runs a single tick.

use crate::devices::mock::config::SimulationConfig;
use crate::error::{KavachError, Result};
use crate::types::ClassId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct KavachConfig {
    #[serde(default)]
    pub perception: PerceptionConfig,
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub evasion: EvasionConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Detection filtering and target geometry
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PerceptionConfig {
    /// Minimum detector confidence for a box to count (default: 0.35)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Fraction of frame width treated as "straight ahead" (default: 0.30)
    #[serde(default = "default_center_region_fraction")]
    pub center_region_fraction: f64,

    /// Classes that count as obstacles; absent means every class
    #[serde(default)]
    pub allowed_obstacle_classes: Option<Vec<ClassId>>,

    /// Classes preferred when picking a tracked target
    /// (default: person, bicycle, car, motorcycle, truck)
    #[serde(default = "default_preferred_target_classes")]
    pub preferred_target_classes: Vec<ClassId>,

    /// Assumed half horizontal field of view in degrees (default: 45)
    #[serde(default = "default_half_fov_deg")]
    pub half_fov_deg: f64,
}

/// Ultrasonic zone thresholds
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ZoneConfig {
    /// Closer than this is Danger (default: 25cm)
    #[serde(default = "default_danger_cm")]
    pub danger_cm: f64,

    /// Closer than this is Caution (default: 50cm)
    #[serde(default = "default_caution_cm")]
    pub caution_cm: f64,
}

/// Steady-state driving parameters, speeds in 0-100 actuator units
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DriveConfig {
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed: u8,

    #[serde(default = "default_caution_speed")]
    pub caution_speed: u8,

    /// Steering bias while in the caution zone (default: -10°, searching left)
    #[serde(default = "default_caution_steer_deg")]
    pub caution_steer_deg: f64,

    /// Actuator throttle upper bound (default: 100)
    #[serde(default = "default_max_speed")]
    pub max_speed: u8,

    /// Steering servo limit in degrees, symmetric (default: 30)
    #[serde(default = "default_max_steer_deg")]
    pub max_steer_deg: f64,
}

/// Timed evasive maneuver parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EvasionConfig {
    /// Steering magnitude while backing away (default: 25°)
    #[serde(default = "default_turn_angle_deg")]
    pub turn_angle_deg: f64,

    #[serde(default = "default_reverse_speed")]
    pub reverse_speed: u8,

    /// Hold after the initial stop (default: 0.1s)
    #[serde(default = "default_pause_s")]
    pub pause_s: f64,

    /// How long to reverse (default: 0.5s)
    #[serde(default = "default_reverse_duration_s")]
    pub reverse_duration_s: f64,
}

/// What the control loop does with its inputs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ControlMode {
    /// Camera and ultrasonic fused
    #[default]
    Fused,
    /// Camera ignored for obstacle decisions
    UltrasonicOnly,
    /// Sense and report only, never drive
    Monitor,
}

/// Control loop settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Inter-tick delay in milliseconds (default: 50)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Reuse the last detector frame for this long when none is ready (default: 500)
    #[serde(default = "default_max_frame_age_ms")]
    pub max_frame_age_ms: u64,

    #[serde(default)]
    pub mode: ControlMode,
}

/// Device selection
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Device type (only "mock" is built in)
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default level for the kavach target (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_confidence_threshold() -> f32 {
    0.35
}
fn default_center_region_fraction() -> f64 {
    0.30
}
fn default_preferred_target_classes() -> Vec<ClassId> {
    vec![0, 1, 2, 3, 7]
}
fn default_half_fov_deg() -> f64 {
    45.0
}
fn default_danger_cm() -> f64 {
    25.0
}
fn default_caution_cm() -> f64 {
    50.0
}
fn default_cruise_speed() -> u8 {
    25
}
fn default_caution_speed() -> u8 {
    10
}
fn default_caution_steer_deg() -> f64 {
    -10.0
}
fn default_max_speed() -> u8 {
    100
}
fn default_max_steer_deg() -> f64 {
    30.0
}
fn default_turn_angle_deg() -> f64 {
    25.0
}
fn default_reverse_speed() -> u8 {
    15
}
fn default_pause_s() -> f64 {
    0.1
}
fn default_reverse_duration_s() -> f64 {
    0.5
}
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_max_frame_age_ms() -> u64 {
    500
}
fn default_device_type() -> String {
    "mock".to_string()
}
fn default_device_name() -> String {
    "Simulated PiCar".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            center_region_fraction: default_center_region_fraction(),
            allowed_obstacle_classes: None,
            preferred_target_classes: default_preferred_target_classes(),
            half_fov_deg: default_half_fov_deg(),
        }
    }
}

impl PerceptionConfig {
    pub fn allowed_classes(&self) -> Option<HashSet<ClassId>> {
        self.allowed_obstacle_classes
            .as_ref()
            .map(|c| c.iter().copied().collect())
    }

    pub fn preferred_classes(&self) -> HashSet<ClassId> {
        self.preferred_target_classes.iter().copied().collect()
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            danger_cm: default_danger_cm(),
            caution_cm: default_caution_cm(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            cruise_speed: default_cruise_speed(),
            caution_speed: default_caution_speed(),
            caution_steer_deg: default_caution_steer_deg(),
            max_speed: default_max_speed(),
            max_steer_deg: default_max_steer_deg(),
        }
    }
}

impl Default for EvasionConfig {
    fn default() -> Self {
        Self {
            turn_angle_deg: default_turn_angle_deg(),
            reverse_speed: default_reverse_speed(),
            pause_s: default_pause_s(),
            reverse_duration_s: default_reverse_duration_s(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_frame_age_ms: default_max_frame_age_ms(),
            mode: ControlMode::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl KavachConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KavachError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KavachConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject configurations that would make the controller unsafe.
    pub fn validate(&self) -> Result<()> {
        let p = &self.perception;
        if !(0.0..=1.0).contains(&p.confidence_threshold) {
            return Err(config_error(format!(
                "confidence_threshold {} outside [0, 1]",
                p.confidence_threshold
            )));
        }
        if !(p.center_region_fraction > 0.0 && p.center_region_fraction <= 1.0) {
            return Err(config_error(format!(
                "center_region_fraction {} outside (0, 1]",
                p.center_region_fraction
            )));
        }
        if !(p.half_fov_deg > 0.0 && p.half_fov_deg < 90.0) {
            return Err(config_error(format!(
                "half_fov_deg {} outside (0, 90)",
                p.half_fov_deg
            )));
        }

        let z = &self.zones;
        if !(z.danger_cm > 0.0) {
            return Err(config_error(format!(
                "danger_cm must be positive, got {}",
                z.danger_cm
            )));
        }
        if !(z.caution_cm.is_finite() && z.danger_cm < z.caution_cm) {
            return Err(config_error(format!(
                "danger_cm ({}) must be below caution_cm ({})",
                z.danger_cm, z.caution_cm
            )));
        }

        let d = &self.drive;
        let e = &self.evasion;
        if d.max_speed > 100 {
            return Err(config_error(format!(
                "max_speed {} exceeds the 0-100 speed scale",
                d.max_speed
            )));
        }
        for (name, speed) in [
            ("cruise_speed", d.cruise_speed),
            ("caution_speed", d.caution_speed),
            ("reverse_speed", e.reverse_speed),
        ] {
            if speed > d.max_speed {
                return Err(config_error(format!(
                    "{} {} exceeds max_speed {}",
                    name, speed, d.max_speed
                )));
            }
        }

        if !(d.max_steer_deg > 0.0) {
            return Err(config_error(format!(
                "max_steer_deg must be positive, got {}",
                d.max_steer_deg
            )));
        }
        if !(d.caution_steer_deg.abs() <= d.max_steer_deg) {
            return Err(config_error(format!(
                "caution_steer_deg {} exceeds steering limit ±{}",
                d.caution_steer_deg, d.max_steer_deg
            )));
        }
        if !(e.turn_angle_deg >= 0.0 && e.turn_angle_deg <= d.max_steer_deg) {
            return Err(config_error(format!(
                "turn_angle_deg {} outside [0, {}]",
                e.turn_angle_deg, d.max_steer_deg
            )));
        }

        if !(e.pause_s >= 0.0 && e.pause_s.is_finite()) {
            return Err(config_error(format!("pause_s {} is invalid", e.pause_s)));
        }
        if !(e.reverse_duration_s >= 0.0 && e.reverse_duration_s.is_finite()) {
            return Err(config_error(format!(
                "reverse_duration_s {} is invalid",
                e.reverse_duration_s
            )));
        }

        if self.control.tick_interval_ms == 0 {
            return Err(config_error("tick_interval_ms must be non-zero".to_string()));
        }

        self.device.simulation.validate().map_err(config_error)?;

        Ok(())
    }
}

fn config_error(msg: String) -> KavachError {
    tracing::warn!("Rejected configuration: {}", msg);
    KavachError::Config(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = KavachConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.perception.confidence_threshold, 0.35);
        assert_eq!(config.perception.center_region_fraction, 0.30);
        assert_eq!(config.zones.danger_cm, 25.0);
        assert_eq!(config.zones.caution_cm, 50.0);
        assert_eq!(config.control.mode, ControlMode::Fused);
        assert_eq!(config.device.device_type, "mock");
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = KavachConfig::default();
        config.zones.danger_cm = 50.0;
        config.zones.caution_cm = 25.0;
        assert!(matches!(config.validate(), Err(KavachError::Config(_))));

        config.zones.danger_cm = 25.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_bounds_values_rejected() {
        let mut config = KavachConfig::default();
        config.drive.cruise_speed = 120;
        assert!(config.validate().is_err());

        let mut config = KavachConfig::default();
        config.evasion.turn_angle_deg = 45.0;
        assert!(config.validate().is_err());

        let mut config = KavachConfig::default();
        config.evasion.turn_angle_deg = -5.0;
        assert!(config.validate().is_err());

        let mut config = KavachConfig::default();
        config.perception.center_region_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = KavachConfig::default();
        config.evasion.reverse_duration_s = -0.5;
        assert!(config.validate().is_err());

        let mut config = KavachConfig::default();
        config.control.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_caution_threshold_rejected() {
        let config =
            KavachConfig::from_toml_str("[zones]\ndanger_cm = 25.0\ncaution_cm = nan").unwrap();
        assert!(matches!(config.validate(), Err(KavachError::Config(_))));

        let mut config = KavachConfig::default();
        config.zones.caution_cm = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_speed_capped_at_scale() {
        let config =
            KavachConfig::from_toml_str("[drive]\nmax_speed = 250\ncruise_speed = 200").unwrap();
        assert!(matches!(config.validate(), Err(KavachError::Config(_))));

        let mut config = KavachConfig::default();
        config.drive.max_speed = 100;
        config.drive.cruise_speed = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nan_simulation_rates_rejected() {
        let config = KavachConfig::from_toml_str(
            "[device.simulation.ultrasonic]\ndropout_rate = nan",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(KavachError::Config(_))));

        let mut config = KavachConfig::default();
        config.device.simulation.camera.frame_drop_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let toml_content = r#"
[zones]
danger_cm = 20.0
caution_cm = 30.0

[perception]
allowed_obstacle_classes = [0, 2]

[control]
mode = "ultrasonic_only"
"#;

        let config = KavachConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.zones.danger_cm, 20.0);
        assert_eq!(config.zones.caution_cm, 30.0);
        assert_eq!(config.control.mode, ControlMode::UltrasonicOnly);
        assert_eq!(config.drive.cruise_speed, 25);
        let allowed = config.perception.allowed_classes().unwrap();
        assert!(allowed.contains(&0) && allowed.contains(&2));
        assert_eq!(allowed.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = KavachConfig::from_toml_str("[zones]\ndanger_cm = \"near\"");
        assert!(matches!(result, Err(KavachError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kavach.toml");
        std::fs::write(&path, "[drive]\ncruise_speed = 30\n").unwrap();

        let config = KavachConfig::load(&path).unwrap();
        assert_eq!(config.drive.cruise_speed, 30);

        let missing = KavachConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(KavachError::Config(_))));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = KavachConfig::from_toml_str(include_str!("../kavach.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.simulation.obstacles.len(), 2);
        assert_eq!(config.device.simulation.obstacles[1].class_id, None);
        assert_eq!(config.device.simulation.camera.frame_drop_rate, 0.05);
        assert_eq!(config.control.max_frame_age_ms, 500);
    }

    #[test]
    fn test_simulation_defaults_fill_in() {
        let config = KavachConfig::from_toml_str(
            "[device.simulation]\nfixed_step_ms = 20\n[device.simulation.car]\nwheelbase_cm = 16.0\n",
        )
        .unwrap();
        let sim = &config.device.simulation;
        assert_eq!(sim.fixed_step_ms, Some(20));
        assert_eq!(sim.car.wheelbase_cm, 16.0);
        assert_eq!(sim.car.robot_radius_cm, 8.0);
        assert_eq!(sim.ultrasonic.max_range_cm, 300.0);
        assert!(!sim.obstacles.is_empty());
    }
}
