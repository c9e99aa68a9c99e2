use crate::devices::Dht11;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("Poll interval must be at least 1 second, got {0}")]
    IntervalTooShort(u64),
}

/// Settings for a monitoring session
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub gpio_pin: u8,                // BCM pin the DATA line is wired to
    pub iio_root: PathBuf,           // where IIO devices are discovered
    pub device: Option<PathBuf>,     // explicit IIO device directory, skips discovery
    pub interval: Duration,          // delay between polls
    pub warmup: Duration,            // wait before the first poll
    pub error_threshold: u64,        // consecutive failures before troubleshooting help
    pub clear_screen: bool,          // redraw instead of scrolling
    pub record_csv: bool,            // write successful readings to CSV
    pub log_dir: PathBuf,            // log file and CSV directory
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            gpio_pin: 4,
            iio_root: PathBuf::from(Dht11::DEFAULT_IIO_ROOT),
            device: None,
            interval: Duration::from_secs(2),
            warmup: Duration::from_secs(3),
            error_threshold: 5,
            clear_screen: true,
            record_csv: true,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl MonitorConfig {
    /// Load overrides from the process environment.
    ///
    /// | Env Var                 | Default                |
    /// |-------------------------|------------------------|
    /// | `DHT11_GPIO_PIN`        | `4`                    |
    /// | `DHT11_IIO_ROOT`        | `/sys/bus/iio/devices` |
    /// | `DHT11_DEVICE`          | unset                  |
    /// | `DHT11_INTERVAL_SECS`   | `2`                    |
    /// | `DHT11_WARMUP_SECS`     | `3`                    |
    /// | `DHT11_ERROR_THRESHOLD` | `5`                    |
    /// | `DHT11_CLEAR_SCREEN`    | `true`                 |
    /// | `DHT11_CSV`             | `true`                 |
    /// | `DHT11_LOG_DIR`         | `logs`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(pin) = parse_var(&lookup, "DHT11_GPIO_PIN")? {
            config.gpio_pin = pin;
        }
        if let Some(root) = lookup("DHT11_IIO_ROOT") {
            config.iio_root = PathBuf::from(root);
        }
        config.device = lookup("DHT11_DEVICE").filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DHT11_INTERVAL_SECS")? {
            if secs < 1 {
                return Err(ConfigError::IntervalTooShort(secs));
            }
            config.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "DHT11_WARMUP_SECS")? {
            config.warmup = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var(&lookup, "DHT11_ERROR_THRESHOLD")? {
            config.error_threshold = threshold;
        }
        if let Some(clear) = parse_flag(&lookup, "DHT11_CLEAR_SCREEN")? {
            config.clear_screen = clear;
        }
        if let Some(csv) = parse_flag(&lookup, "DHT11_CSV")? {
            config.record_csv = csv;
        }
        if let Some(dir) = lookup("DHT11_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}
