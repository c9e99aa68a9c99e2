use crate::devices::Reading;
use std::fmt;

/// Qualitative label for a temperature/humidity pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComfortLevel {
    Comfortable,
    TooCold,
    TooHot,
    TooDry,
    TooHumid,
    Moderate,
}

impl ComfortLevel {
    // First matching band wins, so a cold and dry room reads as TooCold.
    pub fn from_values(temperature_celsius: f64, humidity_percent: f64) -> Self {
        let t = temperature_celsius;
        let h = humidity_percent;
        if (20.0..=26.0).contains(&t) && (40.0..=60.0).contains(&h) {
            ComfortLevel::Comfortable
        } else if t < 16.0 {
            ComfortLevel::TooCold
        } else if t > 30.0 {
            ComfortLevel::TooHot
        } else if h < 30.0 {
            ComfortLevel::TooDry
        } else if h > 70.0 {
            ComfortLevel::TooHumid
        } else {
            ComfortLevel::Moderate
        }
    }

    pub fn classify(reading: &Reading) -> Self {
        Self::from_values(reading.temperature_celsius, reading.humidity_percent)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComfortLevel::Comfortable => "Comfortable",
            ComfortLevel::TooCold => "Too Cold",
            ComfortLevel::TooHot => "Too Hot",
            ComfortLevel::TooDry => "Too Dry",
            ComfortLevel::TooHumid => "Too Humid",
            ComfortLevel::Moderate => "Moderate",
        }
    }
}

impl fmt::Display for ComfortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
