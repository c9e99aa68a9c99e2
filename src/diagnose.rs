//! One-shot system checks for when the monitor cannot find or read the sensor.
//!
//! Reports the board model, whether the IIO tree is readable, which IIO
//! devices exist, whether the `dht11` overlay is configured (and on which
//! pin), and which GPIO character devices are present.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Filesystem locations inspected by the diagnostics
#[derive(Debug, Clone)]
pub struct DiagnosticPaths {
    pub cpuinfo: PathBuf,
    pub iio_root: PathBuf,
    pub boot_configs: Vec<PathBuf>,
    pub dev_dir: PathBuf,
}

impl DiagnosticPaths {
    pub fn system(iio_root: &Path) -> Self {
        DiagnosticPaths {
            cpuinfo: PathBuf::from("/proc/cpuinfo"),
            iio_root: iio_root.to_path_buf(),
            boot_configs: vec![PathBuf::from("/boot/firmware/config.txt"), PathBuf::from("/boot/config.txt")],
            dev_dir: PathBuf::from("/dev"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IioDevice {
    pub dir: PathBuf,
    pub name: Option<String>,
    pub readable: bool, // temperature channel can be opened
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub config: PathBuf,
    pub line: String,
    pub gpio_pin: Option<u8>,
}

#[derive(Debug)]
pub struct DiagnosticReport {
    pub board_model: Option<String>,
    pub iio_root_error: Option<String>,
    pub iio_devices: Vec<IioDevice>,
    pub overlays: Vec<OverlayLine>,
    pub configs_checked: Vec<PathBuf>,
    pub gpio_chips: Vec<PathBuf>,
}

impl DiagnosticReport {
    pub fn collect(paths: &DiagnosticPaths) -> Self {
        info!("Running diagnostics with {:?}", paths);

        let (iio_devices, iio_root_error) = match scan_iio(&paths.iio_root) {
            Ok(devices) => (devices, None),
            Err(e) => {
                warn!("Cannot read {}: {}", paths.iio_root.display(), e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let mut overlays = Vec::new();
        let mut configs_checked = Vec::new();
        for config in &paths.boot_configs {
            if let Ok(contents) = fs::read_to_string(config) {
                configs_checked.push(config.clone());
                overlays.extend(find_overlays(config, &contents));
            }
        }

        DiagnosticReport {
            board_model: fs::read_to_string(&paths.cpuinfo)
                .ok()
                .and_then(|contents| board_model(&contents)),
            iio_root_error,
            iio_devices,
            overlays,
            configs_checked,
            gpio_chips: gpio_chips(&paths.dev_dir),
        }
    }

    pub fn dht11_device(&self) -> Option<&IioDevice> {
        self.iio_devices.iter().find(|d| d.name.as_deref() == Some("dht11"))
    }

    /// Problems an operator has to fix, given the pin the monitor expects
    pub fn problems(&self, gpio_pin: u8) -> Vec<String> {
        let mut problems = Vec::new();
        if let Some(err) = &self.iio_root_error {
            problems.push(format!("IIO devices are not readable: {}", err));
        }
        match self.dht11_device() {
            None => problems.push("No dht11 IIO device is present".to_string()),
            Some(device) if !device.readable => problems.push(format!(
                "{} exists but its channels cannot be opened, check permissions",
                device.dir.display()
            )),
            Some(_) => {}
        }
        if self.overlays.is_empty() {
            problems.push("No dtoverlay=dht11 line in the boot configuration".to_string());
        }
        for overlay in &self.overlays {
            // The overlay defaults to GPIO4 when gpiopin is omitted
            let pin = overlay.gpio_pin.unwrap_or(4);
            if pin != gpio_pin {
                problems.push(format!(
                    "{} configures GPIO{} but the monitor expects GPIO{}",
                    overlay.config.display(),
                    pin,
                    gpio_pin
                ));
            }
        }
        if self.gpio_chips.is_empty() {
            problems.push("No /dev/gpiochip* devices, GPIO is not available".to_string());
        }
        problems
    }

    pub fn render<W: Write>(&self, out: &mut W, gpio_pin: u8) -> io::Result<()> {
        writeln!(out, "DHT11 Diagnostics")?;
        writeln!(out, "{}", "=".repeat(40))?;
        writeln!(out, "Board: {}", self.board_model.as_deref().unwrap_or("unknown"))?;

        writeln!(out, "IIO devices:")?;
        if self.iio_devices.is_empty() {
            writeln!(out, "   (none)")?;
        }
        for device in &self.iio_devices {
            writeln!(
                out,
                "   {}: {}{}",
                device.dir.display(),
                device.name.as_deref().unwrap_or("?"),
                if device.readable { "" } else { " (channels not readable)" }
            )?;
        }

        writeln!(out, "Boot configuration:")?;
        if self.configs_checked.is_empty() {
            writeln!(out, "   (no config.txt found)")?;
        }
        for overlay in &self.overlays {
            writeln!(out, "   {}: {}", overlay.config.display(), overlay.line)?;
        }

        writeln!(out, "GPIO chips: {}", self.gpio_chips.len())?;
        writeln!(out)?;

        let problems = self.problems(gpio_pin);
        if problems.is_empty() {
            writeln!(out, "All checks passed")?;
        } else {
            writeln!(out, "Problems found:")?;
            for (i, problem) in problems.iter().enumerate() {
                writeln!(out, "{}. {}", i + 1, problem)?;
            }
        }
        out.flush()
    }
}

fn board_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "Model")
        .map(|(_, value)| value.trim().to_string())
        .filter(|model| !model.is_empty())
}

fn scan_iio(root: &Path) -> io::Result<Vec<IioDevice>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("iio:device"))
        })
        .collect();
    dirs.sort();

    Ok(dirs
        .into_iter()
        .map(|dir| IioDevice {
            name: fs::read_to_string(dir.join("name")).ok().map(|n| n.trim().to_string()),
            readable: fs::File::open(dir.join("in_temp_input")).is_ok(),
            dir,
        })
        .collect())
}

fn find_overlays(config: &Path, contents: &str) -> Vec<OverlayLine> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let params = line.strip_prefix("dtoverlay=")?;
            let mut parts = params.split(',');
            if parts.next()?.trim() != "dht11" {
                return None;
            }
            let gpio_pin = parts
                .filter_map(|p| p.trim().strip_prefix("gpiopin="))
                .find_map(|pin| pin.parse().ok());
            Some(OverlayLine {
                config: config.to_path_buf(),
                line: line.to_string(),
                gpio_pin,
            })
        })
        .collect()
}

fn gpio_chips(dev_dir: &Path) -> Vec<PathBuf> {
    let mut chips: Vec<PathBuf> = match fs::read_dir(dev_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("gpiochip"))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    chips.sort();
    chips
}
