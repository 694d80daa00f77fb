//! Device implementations

pub mod mock;

use crate::config::KavachConfig;
use crate::drivers::{ActuatorPort, DetectionSource, RangeSensor};
use crate::error::{KavachError, Result};
use mock::MockDevice;

/// Drivers for one physical (or simulated) car
pub struct Device {
    pub name: String,
    pub actuator: Box<dyn ActuatorPort + Send>,
    pub range_sensor: Box<dyn RangeSensor + Send>,
    pub camera: Box<dyn DetectionSource + Send>,
}

/// Create the device drivers selected by `[device] type`
pub fn create_device(config: &KavachConfig) -> Result<Device> {
    match config.device.device_type.as_str() {
        "mock" => {
            let sim = MockDevice::new(config.device.simulation.clone());
            Ok(Device {
                name: config.device.name.clone(),
                actuator: Box::new(sim.actuator()),
                range_sensor: Box::new(sim.range_sensor()),
                camera: Box::new(sim.camera()),
            })
        }
        _ => Err(KavachError::UnknownDevice(config.device.device_type.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device_type_is_rejected() {
        let mut config = KavachConfig::default();
        config.device.device_type = "picar-x".to_string();
        assert!(matches!(
            create_device(&config),
            Err(KavachError::UnknownDevice(t)) if t == "picar-x"
        ));
    }

    #[test]
    fn test_mock_device_is_built_by_default() {
        let device = create_device(&KavachConfig::default()).unwrap();
        assert_eq!(device.name, "Simulated PiCar");
    }
}
