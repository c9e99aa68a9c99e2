use crate::devices::Reading;
use crate::monitor::data::ReadingRecord;
use csv::Writer;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Appends one CSV row per successful reading, flushing as it goes so a
/// killed process still leaves a usable file.
pub struct ReadingLog {
    writer: Writer<Box<dyn Write>>,
}

impl ReadingLog {
    pub fn from_writer(inner: Box<dyn Write>) -> Self {
        ReadingLog {
            writer: Writer::from_writer(inner),
        }
    }

    /// Create a timestamped CSV file inside `dir`.
    pub fn create_in(dir: &Path) -> io::Result<(Self, PathBuf)> {
        let file_name = chrono::Local::now()
            .format("dht11_readings_%Y-%m-%d_%H-%M-%S.csv")
            .to_string();

        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let file = File::create(&path)?;

        info!("Recording readings to {}", path.display());
        Ok((Self::from_writer(Box::new(file)), path))
    }

    pub fn append(&mut self, reading: &Reading) -> Result<(), csv::Error> {
        self.writer.serialize(ReadingRecord::from(reading))?;
        self.writer.flush()?;
        Ok(())
    }
}
