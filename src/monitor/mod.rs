pub mod comfort;
pub mod data;
pub mod display;
pub mod record;
pub mod shutdown;

use crate::config::MonitorConfig;
use crate::devices::{Reading, Sensor, SensorError};
use comfort::ComfortLevel;
use data::Statistics;
use display::Screen;
use record::ReadingLog;
use shutdown::Shutdown;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a single poll produced
#[derive(Debug)]
pub enum PollOutcome {
    Success(Reading),
    Failure(SensorError),
}

/// Polls a sensor at a fixed cadence and renders each result.
///
/// Sensor failures of any kind are counted and reported, never fatal.
/// The only ways out of [`PollingMonitor::run`] are a shutdown request or
/// the output stream itself failing.
pub struct PollingMonitor<S: Sensor, W: Write> {
    sensor: S,
    screen: Screen<W>,
    stats: Statistics,
    interval: Duration,
    warmup: Duration,
    recorder: Option<ReadingLog>,
}

impl<S: Sensor, W: Write> PollingMonitor<S, W> {
    pub fn new(sensor: S, out: W, config: &MonitorConfig) -> Self {
        let screen = Screen::new(
            out,
            config.clear_screen,
            config.gpio_pin,
            config.interval.as_secs(),
            config.error_threshold,
        );
        PollingMonitor {
            sensor,
            screen,
            stats: Statistics::default(),
            interval: config.interval,
            warmup: config.warmup,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: ReadingLog) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[cfg(test)]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.screen.into_inner()
    }

    /// Read the sensor once, update the statistics and render the result.
    pub fn poll_once(&mut self) -> io::Result<PollOutcome> {
        self.screen.header()?;

        let outcome = match self.sensor.read().and_then(Reading::validate) {
            Ok(reading) => {
                self.stats.record_success();
                info!(
                    "Reading: {:.1}°C, {:.1}%, {}",
                    reading.temperature_celsius,
                    reading.humidity_percent,
                    ComfortLevel::classify(&reading)
                );
                self.record(&reading);
                self.screen.reading(&reading, &self.stats)?;
                PollOutcome::Success(reading)
            }
            Err(e) => {
                self.stats.record_failure();
                warn!(
                    "Sensor read failed ({} consecutive): {}",
                    self.stats.consecutive_failures, e
                );
                self.screen.failure(&e, &self.stats)?;
                PollOutcome::Failure(e)
            }
        };

        self.screen.footer()?;
        Ok(outcome)
    }

    /// Poll until `shutdown` fires, then render the final summary.
    pub fn run(&mut self, shutdown: &Shutdown) -> io::Result<Statistics> {
        info!(
            "Starting monitor: interval {:?}, warm-up {:?}",
            self.interval, self.warmup
        );

        let mut interrupted = false;
        if !self.warmup.is_zero() {
            self.screen.warming_up(self.warmup.as_secs())?;
            interrupted = shutdown.wait(self.warmup);
        }

        while !interrupted {
            match self.poll_once()? {
                PollOutcome::Success(reading) => debug!("Poll succeeded at {}", reading.timestamp.to_rfc3339()),
                PollOutcome::Failure(e) => debug!("Poll failed: {:?}", e),
            }
            interrupted = shutdown.wait(self.interval);
        }

        info!(
            "Monitor stopped after {} attempts ({} ok, {} failed)",
            self.stats.total_attempts, self.stats.successful_reads, self.stats.failed_reads
        );
        self.screen.summary(&self.stats)?;
        Ok(self.stats)
    }

    // A broken reading log should not stop monitoring; drop it and carry on.
    fn record(&mut self, reading: &Reading) {
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.append(reading) {
                warn!("Failed to record reading, disabling CSV output: {}", e);
                self.recorder = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use super::shutdown::ShutdownTrigger;
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    type Step = fn() -> Result<Reading, SensorError>;

    /// Replays a fixed pattern of results and can request shutdown after a
    /// given number of reads.
    struct ScriptedSensor {
        pattern: Vec<Step>,
        reads: usize,
        stop_after: Option<(usize, ShutdownTrigger)>,
    }

    impl ScriptedSensor {
        fn new(pattern: &[Step]) -> Self {
            ScriptedSensor {
                pattern: pattern.to_vec(),
                reads: 0,
                stop_after: None,
            }
        }

        fn stop_after(mut self, reads: usize, trigger: ShutdownTrigger) -> Self {
            self.stop_after = Some((reads, trigger));
            self
        }
    }

    impl Sensor for ScriptedSensor {
        fn read(&mut self) -> Result<Reading, SensorError> {
            let result = self.pattern[self.reads % self.pattern.len()]();
            self.reads += 1;
            if let Some((limit, trigger)) = &self.stop_after {
                if self.reads == *limit {
                    trigger.fire();
                }
            }
            result
        }
    }

    fn comfortable() -> Result<Reading, SensorError> {
        Ok(Reading::new(22.0, 45.0))
    }

    fn no_data() -> Result<Reading, SensorError> {
        Err(SensorError::NoData)
    }

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_millis(5),
            warmup: Duration::ZERO,
            clear_screen: false,
            ..MonitorConfig::default()
        }
    }

    fn monitor(sensor: ScriptedSensor) -> PollingMonitor<ScriptedSensor, Vec<u8>> {
        PollingMonitor::new(sensor, Vec::new(), &test_config())
    }

    #[test]
    fn attempts_match_polls() {
        let mut m = monitor(ScriptedSensor::new(&[comfortable, no_data, no_data]));
        for n in 1..=9u64 {
            m.poll_once().unwrap();
            let stats = m.statistics();
            assert_eq!(stats.total_attempts, n);
            assert_eq!(stats.successful_reads + stats.failed_reads, stats.total_attempts);
        }
    }

    #[test]
    fn always_no_data_counts_failures() {
        let mut m = monitor(ScriptedSensor::new(&[no_data]));
        for _ in 0..5 {
            assert_matches!(m.poll_once().unwrap(), PollOutcome::Failure(SensorError::NoData));
        }
        assert_eq!(m.statistics().successful_reads, 0);
        assert_eq!(m.statistics().failed_reads, 5);
        assert_eq!(m.statistics().consecutive_failures, 5);
    }

    #[test]
    fn alternating_results_split_evenly() {
        let mut m = monitor(ScriptedSensor::new(&[comfortable, no_data]));
        for _ in 0..10 {
            m.poll_once().unwrap();
        }
        assert_eq!(m.statistics().successful_reads, 5);
        assert_eq!(m.statistics().failed_reads, 5);
        assert_eq!(m.statistics().total_attempts, 10);
    }

    #[test]
    fn success_renders_fahrenheit() {
        let mut m = monitor(ScriptedSensor::new(&[comfortable]));
        assert_matches!(m.poll_once().unwrap(), PollOutcome::Success(r) if r.temperature_celsius == 22.0);
        let out = String::from_utf8(m.into_output()).unwrap();
        assert!(out.contains("Temperature: 22.0°C (71.6°F)"));
        assert!(out.contains("Next reading in 0 seconds..."));
    }

    #[test]
    fn implausible_reading_is_a_failure() {
        fn scorching() -> Result<Reading, SensorError> {
            Ok(Reading::new(250.0, 45.0))
        }
        let mut m = monitor(ScriptedSensor::new(&[scorching]));
        assert_matches!(m.poll_once().unwrap(), PollOutcome::Failure(SensorError::Implausible { .. }));
        assert_eq!(m.statistics().failed_reads, 1);
    }

    #[test]
    fn missing_sensor_does_not_stop_the_loop() {
        fn unplugged() -> Result<Reading, SensorError> {
            Err(SensorError::NotFound("/sys/bus/iio/devices/iio:device0".into()))
        }
        let (trigger, shutdown) = Shutdown::channel();
        let sensor = ScriptedSensor::new(&[unplugged, unplugged, comfortable]).stop_after(4, trigger);
        let mut m = monitor(sensor);

        let stats = m.run(&shutdown).unwrap();
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.failed_reads, 3);
        assert_eq!(stats.successful_reads, 1);
        assert!(String::from_utf8(m.into_output()).unwrap().contains("Monitoring stopped"));
    }

    #[test]
    fn interrupt_mid_wait_emits_summary() {
        let (trigger, shutdown) = Shutdown::channel();
        let config = MonitorConfig {
            interval: Duration::from_secs(30),
            ..test_config()
        };
        let mut m = PollingMonitor::new(ScriptedSensor::new(&[comfortable]), Vec::new(), &config);

        let started = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.fire();
        });
        let stats = m.run(&shutdown).unwrap();
        handle.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(stats.total_attempts, 1);
        let out = String::from_utf8(m.into_output()).unwrap();
        assert!(out.contains("Monitoring stopped"));
        assert!(out.contains("Total Attempts: 1"));
    }

    #[test]
    fn interrupt_during_warmup_skips_polling() {
        let (trigger, shutdown) = Shutdown::channel();
        let config = MonitorConfig {
            warmup: Duration::from_secs(30),
            ..test_config()
        };
        let mut m = PollingMonitor::new(ScriptedSensor::new(&[comfortable]), Vec::new(), &config);

        trigger.fire();
        let stats = m.run(&shutdown).unwrap();
        assert_eq!(stats, Statistics::default());
        let out = String::from_utf8(m.into_output()).unwrap();
        assert!(out.contains("Waiting 30 seconds for sensor to stabilize..."));
        assert!(out.contains("Total Attempts: 0"));
    }

    #[test]
    fn records_only_successful_readings() {
        let dir = TempDir::new().unwrap();
        let (log, path) = ReadingLog::create_in(dir.path()).unwrap();
        let mut m = monitor(ScriptedSensor::new(&[comfortable, no_data])).with_recorder(log);
        for _ in 0..4 {
            m.poll_once().unwrap();
        }

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }
}
