use crate::devices::Reading;
use crate::monitor::comfort::ComfortLevel;
use serde::Serialize;

/// Running success/failure accounting for the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_attempts: u64,
    pub successful_reads: u64,
    pub failed_reads: u64,
    pub consecutive_failures: u64,
}

impl Statistics {
    pub fn record_success(&mut self) {
        self.total_attempts += 1;
        self.successful_reads += 1;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.total_attempts += 1;
        self.failed_reads += 1;
        self.consecutive_failures += 1;
    }

    /// Percentage of successful polls, `None` before the first attempt
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            None
        } else {
            Some(self.successful_reads as f64 / self.total_attempts as f64 * 100.0)
        }
    }
}

#[derive(Serialize)]
pub struct ReadingRecord {
    pub timestamp: String, // local RFC 3339 timestamp
    #[serde(rename = "temperature_C")]
    pub temperature_c: f64,
    #[serde(rename = "temperature_F")]
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub comfort: &'static str,
}

impl From<&Reading> for ReadingRecord {
    fn from(reading: &Reading) -> Self {
        ReadingRecord {
            timestamp: reading.timestamp.to_rfc3339(),
            temperature_c: reading.temperature_celsius,
            temperature_f: reading.temperature_fahrenheit(),
            humidity_pct: reading.humidity_percent,
            comfort: ComfortLevel::classify(reading).label(),
        }
    }
}
