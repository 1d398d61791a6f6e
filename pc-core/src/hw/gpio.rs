//! Fan relay control via sysfs GPIO
//!
//! The fan hangs off a transistor on a single BCM pin. Pin writes go through
//! /sys/class/gpio: export the pin once, set it to output, then write the
//! value file on each transition. The control loop only calls `set_power` on
//! state changes, so the relay is not rewritten every cycle.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::paths;
use crate::error::{PicontrolError, Result};

/// Something that can switch the fan on or off
pub trait FanActuator: Send {
    fn set_power(&mut self, on: bool) -> Result<()>;
}

/// Fan relay on a sysfs GPIO pin
#[derive(Debug)]
pub struct GpioFan {
    pin: u32,
    base: PathBuf,
    exported: bool,
}

impl GpioFan {
    pub fn new(pin: u32) -> Self {
        Self {
            pin,
            base: PathBuf::from(paths::GPIO_BASE),
            exported: false,
        }
    }

    /// Use an alternate sysfs base directory
    pub fn with_base(pin: u32, base: impl Into<PathBuf>) -> Self {
        Self {
            pin,
            base: base.into(),
            exported: false,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    fn pin_dir(&self) -> PathBuf {
        self.base.join(format!("gpio{}", self.pin))
    }

    /// Export the pin and set it to output. Skips the export write when the
    /// pin directory already exists (exported by a previous run).
    fn ensure_exported(&mut self) -> Result<()> {
        if self.exported {
            return Ok(());
        }

        if !self.pin_dir().exists() {
            let export_path = self.base.join("export");
            write_gpio(&export_path, &self.pin.to_string())?;
        }

        let direction_path = self.pin_dir().join("direction");
        write_gpio(&direction_path, "out")?;

        debug!(pin = self.pin, "GPIO exported for fan control");
        self.exported = true;
        Ok(())
    }
}

impl FanActuator for GpioFan {
    fn set_power(&mut self, on: bool) -> Result<()> {
        self.ensure_exported()?;
        let value_path = self.pin_dir().join("value");
        write_gpio(&value_path, if on { "1" } else { "0" })
    }
}

fn write_gpio(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value).map_err(|e| PicontrolError::ActuatorWrite {
        path: path.to_path_buf(),
        reason: format!("Failed to write '{}': {}", value, e),
    })
}
