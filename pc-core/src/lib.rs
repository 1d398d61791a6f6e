//! PiControl Core Library
//!
//! Fan control and configuration core for a Raspberry Pi control panel.
//!
//! # Features
//!
//! - **Configuration Store**: JSON settings document reconciled against a
//!   built-in template on load, preserving unknown keys
//! - **Hysteresis Engine**: two-state on/off fan decision with a dead band
//!   between the thresholds
//! - **Hardware Access**: thermal zone / vcgencmd temperature reads, sysfs
//!   GPIO fan relay, Pi model detection
//! - **Sample Hand-off**: single-slot latest-value cell between the control
//!   loop and a status poller
//!
//! # Module Structure
//!
//! - `config` - Configuration document, template, reconciliation
//! - `engine/` - Hysteresis decision engine
//! - `hw/` - Hardware interaction (sensor, GPIO, model detection)
//! - `handoff` - Latest-sample hand-off cell
//!
//! # Example
//!
//! ```no_run
//! use pc_core::{ConfigStore, FanHysteresis};
//!
//! let store = ConfigStore::at_default_path();
//! let fan = store.fan_settings().unwrap();
//! let mut engine = FanHysteresis::new(fan.threshold_on, fan.threshold_off);
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod handoff;
pub mod hw;

// Re-export primary types
pub use config::{
    default_template, reconcile, ButtonMode, ButtonSettings, ConfigStore, FanSettings,
    SiteSettings, UserSettings,
};

pub use engine::{FanHysteresis, FanState};

pub use handoff::{SampleSlot, ThermalSample};

pub use hw::{fan_pin_for_model, pi_model, CpuTempSensor, FanActuator, GpioFan, TempSensor};

// Re-export error types
pub use error::{PicontrolError, Result};
