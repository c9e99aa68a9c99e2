mod config;
mod devices;
mod diagnose;
mod logging;
mod monitor;

use config::MonitorConfig;
use devices::{DeviceError, Dht11};
use diagnose::{DiagnosticPaths, DiagnosticReport};
use monitor::PollingMonitor;
use monitor::record::ReadingLog;
use monitor::shutdown::{Shutdown, listen_for_interrupt};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return Err(Box::new(e));
        }
    };

    if std::env::args().nth(1).as_deref() == Some("diagnose") {
        let report = DiagnosticReport::collect(&DiagnosticPaths::system(&config.iio_root));
        report.render(&mut std::io::stdout(), config.gpio_pin)?;
        return Ok(());
    }

    // Set up logging; the guard must live until the end of main
    let _guard = match logging::setup_logging(&config.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging in {}: {}", config.log_dir.display(), e);
            eprintln!("Possible solutions:");
            for (i, step) in logging::REMEDIATION.iter().enumerate() {
                eprintln!("{}. {}", i + 1, step);
            }
            return Err(Box::new(e));
        }
    };
    info!("Starting application with configuration: {:?}", config);

    println!("Initializing DHT11 sensor...");
    let sensor = match open_sensor(&config) {
        Ok(sensor) => {
            println!("DHT11 sensor found at {}", sensor.device_dir().display());
            sensor
        }
        Err(e) => {
            error!("Failed to initialize DHT11 sensor: {}", e);
            eprintln!("Failed to initialize DHT11 sensor: {}", e);
            eprintln!("Possible solutions:");
            for (i, step) in e.remediation().iter().enumerate() {
                eprintln!("{}. {}", i + 1, step);
            }
            eprintln!("Run 'dht11-monitor diagnose' for a full system check");
            return Err(Box::new(e));
        }
    };

    let (trigger, shutdown) = Shutdown::channel();
    listen_for_interrupt(trigger)?;

    let mut monitor = PollingMonitor::new(sensor, std::io::stdout(), &config);
    if config.record_csv {
        match ReadingLog::create_in(&config.log_dir) {
            Ok((log, path)) => {
                println!("Recording readings to {}", path.display());
                monitor = monitor.with_recorder(log);
            }
            Err(e) => warn!("Could not create reading log, continuing without it: {}", e),
        }
    }

    match monitor.run(&shutdown) {
        Ok(stats) => {
            info!("Application shutting down after {} attempts", stats.total_attempts);
            println!("Goodbye!");
            Ok(())
        }
        Err(e) => {
            error!("Monitor failed: {}", e);
            Err(Box::new(e))
        }
    }
}

fn open_sensor(config: &MonitorConfig) -> Result<Dht11, DeviceError> {
    match &config.device {
        Some(dir) => Dht11::open(dir),
        None => Dht11::discover(&config.iio_root),
    }
}
