//! Constants shared across PiControl components.

/// Filesystem paths for hardware and configuration access
pub mod paths {
    use std::path::PathBuf;

    /// CPU thermal zone exposed by the Pi kernel (reports millidegrees Celsius)
    pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

    /// Device-tree model string, used to tell Pi generations apart
    pub const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";

    /// Base directory for sysfs GPIO control
    pub const GPIO_BASE: &str = "/sys/class/gpio";

    /// Environment variable overriding the config file location
    pub const CONFIG_ENV: &str = "PICONTROL_CONFIG";

    /// System-wide fallback when no user config directory can be resolved
    pub const SYSTEM_CONFIG_FILE: &str = "/etc/picontrol/config.json";

    /// Resolve the config file path.
    ///
    /// `PICONTROL_CONFIG` wins, then the XDG config directory
    /// (`~/.config/picontrol/config.json`), then the system-wide fallback.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        if let Some(base) = dirs::config_dir() {
            return base.join("picontrol").join("config.json");
        }
        PathBuf::from(SYSTEM_CONFIG_FILE)
    }
}

/// GPIO pin assignments for the fan relay
pub mod gpio {
    /// BCM pin driving the fan transistor on Pi 3 and earlier
    pub const FAN_PIN_LEGACY: u32 = 18;

    /// Pi 4 and later boards route the fan header to BCM 17
    pub const FAN_PIN_PI4: u32 = 17;

    /// First Pi generation that uses [`FAN_PIN_PI4`]
    pub const PI4_MODEL: u32 = 4;
}

/// Temperature conversion
pub mod temperature {
    /// Linux thermal zones report millidegrees Celsius
    pub const MILLIDEGREE_DIVISOR: f32 = 1000.0;
}
