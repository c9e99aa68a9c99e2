use crate::devices::{Reading, SensorError};
use crate::monitor::comfort::ComfortLevel;
use crate::monitor::data::Statistics;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Physical header pin for the BCM numbers people usually wire the sensor to
pub fn physical_pin(gpio_pin: u8) -> Option<u8> {
    match gpio_pin {
        4 => Some(7),
        17 => Some(11),
        18 => Some(12),
        22 => Some(15),
        23 => Some(16),
        24 => Some(18),
        25 => Some(22),
        27 => Some(13),
        _ => None,
    }
}

/// Text rendering of the monitor state onto any output stream
pub struct Screen<W: Write> {
    out: W,
    clear_screen: bool,
    gpio_pin: u8,
    interval_secs: u64,
    error_threshold: u64,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, clear_screen: bool, gpio_pin: u8, interval_secs: u64, error_threshold: u64) -> Self {
        Screen {
            out,
            clear_screen,
            gpio_pin,
            interval_secs,
            error_threshold,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self) -> io::Result<()> {
        if self.clear_screen {
            write!(self.out, "{}", CLEAR)?;
        }
        let rule = "=".repeat(RULE_WIDTH);
        let pin = match physical_pin(self.gpio_pin) {
            Some(physical) => format!("GPIO Pin: {} (Physical Pin {})", self.gpio_pin, physical),
            None => format!("GPIO Pin: {}", self.gpio_pin),
        };
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "{:^width$}", "DHT11 Temperature & Humidity Monitor", width = RULE_WIDTH)?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "{}", pin)?;
        writeln!(self.out, "Press Ctrl+C to exit")?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out)
    }

    pub fn warming_up(&mut self, secs: u64) -> io::Result<()> {
        writeln!(self.out, "Waiting {} seconds for sensor to stabilize...", secs)?;
        self.out.flush()
    }

    pub fn reading(&mut self, reading: &Reading, stats: &Statistics) -> io::Result<()> {
        writeln!(self.out, "Time: {}", reading.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(
            self.out,
            "Temperature: {:.1}°C ({:.1}°F)",
            reading.temperature_celsius,
            reading.temperature_fahrenheit()
        )?;
        writeln!(self.out, "Humidity: {:.1}%", reading.humidity_percent)?;
        writeln!(self.out, "Comfort Level: {}", ComfortLevel::classify(reading))?;
        writeln!(self.out)?;
        self.statistics(stats)
    }

    pub fn failure(&mut self, error: &SensorError, stats: &Statistics) -> io::Result<()> {
        writeln!(self.out, "Failed to read sensor data: {}", error)?;
        writeln!(self.out, "   Error count: {}", stats.failed_reads)?;
        writeln!(self.out, "   Consecutive errors: {}", stats.consecutive_failures)?;
        writeln!(self.out, "Tip: {}", error.hint())?;

        if stats.consecutive_failures > self.error_threshold {
            writeln!(self.out)?;
            writeln!(self.out, "Multiple consecutive errors detected. Troubleshooting steps:")?;
            writeln!(self.out, "   1. Check sensor wiring:")?;
            writeln!(self.out, "      VCC  -> 3.3V (Pin 1)")?;
            writeln!(self.out, "      GND  -> Ground (Pin 6)")?;
            match physical_pin(self.gpio_pin) {
                Some(physical) => writeln!(self.out, "      DATA -> GPIO{} (Pin {})", self.gpio_pin, physical)?,
                None => writeln!(self.out, "      DATA -> GPIO{}", self.gpio_pin)?,
            }
            writeln!(self.out, "   2. Check permissions on /sys/bus/iio/devices")?;
            writeln!(self.out, "   3. Confirm the dht11 overlay is enabled for this pin")?;
            writeln!(self.out, "   4. Ensure a stable power supply")?;
        }
        Ok(())
    }

    pub fn footer(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Next reading in {} seconds...", self.interval_secs)?;
        self.out.flush()
    }

    pub fn summary(&mut self, stats: &Statistics) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Monitoring stopped")?;
        self.statistics(stats)?;
        self.out.flush()
    }

    fn statistics(&mut self, stats: &Statistics) -> io::Result<()> {
        writeln!(self.out, "Statistics:")?;
        writeln!(self.out, "   Total Attempts: {}", stats.total_attempts)?;
        writeln!(self.out, "   Successful Reads: {}", stats.successful_reads)?;
        writeln!(self.out, "   Failed Reads: {}", stats.failed_reads)?;
        if let Some(rate) = stats.success_rate() {
            writeln!(self.out, "   Success Rate: {:.1}%", rate)?;
        }
        Ok(())
    }
}
