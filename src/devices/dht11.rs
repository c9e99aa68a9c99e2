use super::{Reading, Sensor, SensorError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const TEMPERATURE_CHANNEL: &str = "in_temp_input";
const HUMIDITY_CHANNEL: &str = "in_humidityrelative_input";
const DRIVER_NAME: &str = "dht11";
// errno the kernel driver returns when the frame checksum does not match
const EIO: i32 = 5;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No dht11 device found under {}", .root.display())]
    NoDevice { root: PathBuf },

    #[error("Device is missing channel {}", .0.display())]
    MissingChannel(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DeviceError {
    /// Steps the operator can take before trying again.
    pub fn remediation(&self) -> &'static [&'static str] {
        match self {
            DeviceError::NoDevice { .. } | DeviceError::MissingChannel(_) => &[
                "Enable the kernel driver: add 'dtoverlay=dht11,gpiopin=4' to /boot/config.txt and reboot",
                "Check wiring: VCC -> 3.3V (Pin 1), GND -> Ground (Pin 6), DATA -> GPIO4 (Pin 7)",
                "Point DHT11_DEVICE at the sensor's IIO directory if it lives elsewhere",
            ],
            DeviceError::Io(_) => &[
                "Run with sufficient permissions to read /sys/bus/iio/devices",
                "Check that the dht11 overlay loaded: ls /sys/bus/iio/devices",
            ],
        }
    }
}

/// DHT11 read through the Linux `dht11` IIO driver.
///
/// The kernel handles the single-wire timing and checksum; this reads the
/// processed channels (milli-units) out of sysfs.
#[derive(Debug)]
pub struct Dht11 {
    device_dir: PathBuf,
    temperature_path: PathBuf,
    humidity_path: PathBuf,
}

impl Dht11 {
    pub const DEFAULT_IIO_ROOT: &'static str = "/sys/bus/iio/devices";

    /// Find the first IIO device under `root` whose driver name is `dht11`.
    pub fn discover(root: &Path) -> Result<Self, DeviceError> {
        info!("Scanning {} for a dht11 device", root.display());
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DeviceError::NoDevice { root: root.to_path_buf() });
            }
            Err(e) => return Err(e.into()),
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("iio:device"))
            })
            .collect();
        candidates.sort();

        for dir in candidates {
            match fs::read_to_string(dir.join("name")) {
                Ok(name) if name.trim() == DRIVER_NAME => return Self::open(dir),
                Ok(name) => debug!("Skipping {} ({})", dir.display(), name.trim()),
                Err(e) => warn!("Could not read name of {}: {}", dir.display(), e),
            }
        }

        Err(DeviceError::NoDevice { root: root.to_path_buf() })
    }

    pub fn open(device_dir: impl Into<PathBuf>) -> Result<Self, DeviceError> {
        let device_dir = device_dir.into();
        let temperature_path = device_dir.join(TEMPERATURE_CHANNEL);
        let humidity_path = device_dir.join(HUMIDITY_CHANNEL);

        for path in [&temperature_path, &humidity_path] {
            if !path.exists() {
                return Err(DeviceError::MissingChannel(path.clone()));
            }
        }

        info!("Using DHT11 at {}", device_dir.display());
        Ok(Dht11 {
            device_dir,
            temperature_path,
            humidity_path,
        })
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    fn read_channel(path: &Path) -> Result<f64, SensorError> {
        let raw = fs::read_to_string(path).map_err(|e| classify_io_error(e, path))?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SensorError::NoData);
        }
        let milli: i64 = raw
            .parse()
            .map_err(|_| SensorError::Parse(format!("{}: unexpected value '{}'", path.display(), raw)))?;
        Ok(milli as f64 / 1000.0)
    }
}

impl Sensor for Dht11 {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let temperature = Self::read_channel(&self.temperature_path)?;
        let humidity = Self::read_channel(&self.humidity_path)?;
        debug!("Raw values - Temp: {}, Humidity: {}", temperature, humidity);
        Ok(Reading::new(temperature, humidity))
    }
}

fn classify_io_error(err: io::Error, path: &Path) -> SensorError {
    match err.kind() {
        io::ErrorKind::NotFound => SensorError::NotFound(path.to_path_buf()),
        io::ErrorKind::TimedOut => SensorError::Timeout,
        _ if err.raw_os_error() == Some(EIO) => SensorError::Checksum,
        _ => SensorError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn fake_device(root: &Path, index: u32, name: &str, temp: &str, humidity: &str) -> PathBuf {
        let dir = root.join(format!("iio:device{}", index));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{}\n", name)).unwrap();
        fs::write(dir.join(TEMPERATURE_CHANNEL), temp).unwrap();
        fs::write(dir.join(HUMIDITY_CHANNEL), humidity).unwrap();
        dir
    }

    #[test]
    fn discovers_dht11_among_other_devices() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), 0, "ads1015", "0\n", "0\n");
        let expected = fake_device(root.path(), 1, "dht11", "22000\n", "45000\n");

        let sensor = Dht11::discover(root.path()).unwrap();
        assert_eq!(sensor.device_dir(), expected.as_path());
    }

    #[test]
    fn discover_without_device_fails() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), 0, "bme280", "0", "0");
        assert_matches!(Dht11::discover(root.path()), Err(DeviceError::NoDevice { .. }));

        let missing = root.path().join("nope");
        assert_matches!(Dht11::discover(&missing), Err(DeviceError::NoDevice { .. }));
    }

    #[test]
    fn open_requires_both_channels() {
        let root = TempDir::new().unwrap();
        let dir = fake_device(root.path(), 0, "dht11", "1", "1");
        fs::remove_file(dir.join(HUMIDITY_CHANNEL)).unwrap();
        assert_matches!(Dht11::open(&dir), Err(DeviceError::MissingChannel(path)) if path.ends_with(HUMIDITY_CHANNEL));
    }

    #[test]
    fn reads_scaled_values() {
        let root = TempDir::new().unwrap();
        let dir = fake_device(root.path(), 0, "dht11", "23500\n", "41000\n");
        let mut sensor = Dht11::open(dir).unwrap();

        let reading = sensor.read().unwrap();
        assert!((reading.temperature_celsius - 23.5).abs() < 1e-9);
        assert!((reading.humidity_percent - 41.0).abs() < 1e-9);
    }

    #[test]
    fn empty_channel_is_no_data() {
        let root = TempDir::new().unwrap();
        let dir = fake_device(root.path(), 0, "dht11", "", "41000");
        let mut sensor = Dht11::open(dir).unwrap();
        assert_matches!(sensor.read(), Err(SensorError::NoData));
    }

    #[test]
    fn garbage_is_parse_error_and_vanished_device_is_not_found() {
        let root = TempDir::new().unwrap();
        let dir = fake_device(root.path(), 0, "dht11", "warm", "41000");
        let mut sensor = Dht11::open(&dir).unwrap();
        assert_matches!(sensor.read(), Err(SensorError::Parse(_)));

        fs::remove_dir_all(&dir).unwrap();
        assert_matches!(sensor.read(), Err(SensorError::NotFound(_)));
    }

    #[test]
    fn classifies_kernel_errors() {
        let path = Path::new("in_temp_input");
        assert_matches!(
            classify_io_error(io::Error::from_raw_os_error(EIO), path),
            SensorError::Checksum
        );
        assert_matches!(
            classify_io_error(io::Error::new(io::ErrorKind::TimedOut, "slow"), path),
            SensorError::Timeout
        );
        assert_matches!(
            classify_io_error(io::Error::new(io::ErrorKind::PermissionDenied, "no"), path),
            SensorError::Io(_)
        );
    }
}
