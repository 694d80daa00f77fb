//! Error types for Kavach

use thiserror::Error;

use crate::drivers::SensorError;

/// Kavach error type
#[derive(Error, Debug)]
pub enum KavachError {
    /// Unsafe or malformed configuration, rejected before the first tick
    #[error("Configuration error: {0}")]
    Config(String),

    /// Steering or throttle command could not be delivered
    #[error("Actuator failure: {0}")]
    Actuator(String),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for KavachError {
    fn from(e: toml::de::Error) -> Self {
        KavachError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KavachError>;
