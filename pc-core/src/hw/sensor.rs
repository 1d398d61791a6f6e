//! CPU temperature sources
//!
//! The kernel thermal zone is the primary source: a sysfs file holding
//! millidegrees Celsius, converted to standard Celsius here. Older Pi images
//! without a thermal zone still ship the `vcgencmd` firmware tool, so that is
//! the fallback. The controller only needs "read one float, or fail".

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::constants::{paths, temperature};
use crate::error::{PicontrolError, Result};

/// A source of one temperature reading in °C
pub trait TempSensor: Send {
    fn read_temp(&self) -> Result<f32>;
}

/// CPU temperature from the kernel thermal zone, with a `vcgencmd
/// measure_temp` fallback when the zone cannot be read.
#[derive(Debug, Clone)]
pub struct CpuTempSensor {
    zone_path: PathBuf,
}

impl CpuTempSensor {
    pub fn new() -> Self {
        Self {
            zone_path: PathBuf::from(paths::THERMAL_ZONE),
        }
    }

    /// Read from an alternate thermal zone file
    pub fn with_zone(zone_path: impl Into<PathBuf>) -> Self {
        Self {
            zone_path: zone_path.into(),
        }
    }

    fn read_zone(&self) -> Result<f32> {
        let content =
            fs::read_to_string(&self.zone_path).map_err(|e| PicontrolError::TemperatureRead {
                path: self.zone_path.clone(),
                reason: format!("Failed to read: {}", e),
            })?;

        let millidegrees = content.trim().parse::<i32>().map_err(|e| {
            PicontrolError::TemperatureRead {
                path: self.zone_path.clone(),
                reason: format!("Failed to parse '{}': {}", content.trim(), e),
            }
        })?;

        Ok(millidegrees as f32 / temperature::MILLIDEGREE_DIVISOR)
    }

    fn read_vcgencmd() -> Result<f32> {
        let output = Command::new("vcgencmd")
            .arg("measure_temp")
            .output()
            .map_err(|e| PicontrolError::sensor(format!("vcgencmd not runnable: {}", e)))?;

        if !output.status.success() {
            return Err(PicontrolError::sensor(format!(
                "vcgencmd exited with {}",
                output.status
            )));
        }

        parse_vcgencmd_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for CpuTempSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl TempSensor for CpuTempSensor {
    fn read_temp(&self) -> Result<f32> {
        match self.read_zone() {
            Ok(t) => Ok(t),
            Err(zone_err) => Self::read_vcgencmd().map_err(|cmd_err| {
                PicontrolError::sensor(format!(
                    "thermal zone: {}; vcgencmd: {}",
                    zone_err, cmd_err
                ))
            }),
        }
    }
}

/// Parse `vcgencmd measure_temp` output, e.g. `temp=48.3'C`
fn parse_vcgencmd_output(raw: &str) -> Result<f32> {
    raw.trim()
        .strip_prefix("temp=")
        .and_then(|rest| rest.trim_end_matches("'C").parse::<f32>().ok())
        .ok_or_else(|| {
            PicontrolError::sensor(format!("unexpected vcgencmd output: '{}'", raw.trim()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn zone_read_converts_millidegrees() {
        let dir = TempDir::new().unwrap();
        let zone = dir.path().join("temp");
        std::fs::write(&zone, "48300\n").unwrap();

        let sensor = CpuTempSensor::with_zone(&zone);
        assert_eq!(sensor.read_zone().unwrap(), 48.3);
    }

    #[test]
    fn zone_read_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let zone = dir.path().join("temp");
        std::fs::write(&zone, "not-a-number\n").unwrap();

        let err = CpuTempSensor::with_zone(&zone).read_zone().unwrap_err();
        assert!(matches!(err, PicontrolError::TemperatureRead { .. }));
    }

    #[test]
    fn missing_zone_is_a_read_error() {
        let err = CpuTempSensor::with_zone("/nonexistent/thermal")
            .read_zone()
            .unwrap_err();
        assert!(matches!(err, PicontrolError::TemperatureRead { .. }));
    }

    #[test]
    fn vcgencmd_output_parses() {
        assert_eq!(parse_vcgencmd_output("temp=48.3'C\n").unwrap(), 48.3);
        assert_eq!(parse_vcgencmd_output("temp=60.0'C").unwrap(), 60.0);
    }

    #[test]
    fn vcgencmd_garbage_is_rejected() {
        assert!(parse_vcgencmd_output("VCHI initialization failed").is_err());
        assert!(parse_vcgencmd_output("").is_err());
    }
}
