pub mod dht11;

pub use dht11::{DeviceError, Dht11};

use chrono::{DateTime, Local};
use std::path::PathBuf;
use thiserror::Error;

/// Plausible temperature window for the sensor, in °C
pub const TEMPERATURE_RANGE_C: std::ops::RangeInclusive<f64> = -20.0..=60.0;
/// Plausible relative humidity window, in %
pub const HUMIDITY_RANGE_PCT: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// A single temperature/humidity sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub timestamp: DateTime<Local>,
}

impl Reading {
    pub fn new(temperature_celsius: f64, humidity_percent: f64) -> Self {
        Reading {
            temperature_celsius,
            humidity_percent,
            timestamp: Local::now(),
        }
    }

    pub fn temperature_fahrenheit(&self) -> f64 {
        celsius_to_fahrenheit(self.temperature_celsius)
    }

    /// Rejects values the sensor cannot physically produce.
    pub fn validate(self) -> Result<Self, SensorError> {
        let t = self.temperature_celsius;
        let h = self.humidity_percent;
        if t.is_finite() && h.is_finite() && TEMPERATURE_RANGE_C.contains(&t) && HUMIDITY_RANGE_PCT.contains(&h) {
            Ok(self)
        } else {
            Err(SensorError::Implausible {
                temperature_celsius: t,
                humidity_percent: h,
            })
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor returned no data")]
    NoData,

    #[error("Timed out waiting for the sensor")]
    Timeout,

    #[error("Checksum mismatch in sensor frame")]
    Checksum,

    #[error("Sensor device not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Implausible reading: {temperature_celsius}°C, {humidity_percent}%")]
    Implausible {
        temperature_celsius: f64,
        humidity_percent: f64,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Operator-facing tip for this kind of failure.
    pub fn hint(&self) -> &'static str {
        match self {
            SensorError::NoData => "The DHT11 often misses a cycle, the next poll will retry",
            SensorError::Timeout => "Check that the DATA line is connected to the configured GPIO pin",
            SensorError::Checksum => "This is normal occasionally, the sensor will retry",
            SensorError::NotFound(_) => {
                "Check that the dht11 overlay is enabled and that you have permission to read sysfs"
            }
            SensorError::Implausible { .. } => "Values outside the sensor's range usually mean a loose connection",
            SensorError::Parse(_) | SensorError::Io(_) => "DHT sensor communication error, check wiring",
        }
    }
}

/// Anything that can hand out temperature/humidity readings
pub trait Sensor {
    fn read(&mut self) -> Result<Reading, SensorError>;
}
