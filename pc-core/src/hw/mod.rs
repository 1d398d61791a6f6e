//! Hardware interaction modules
//!
//! Low-level access to the CPU temperature source, the fan relay GPIO, and
//! the device-tree model string.

mod gpio;
mod model;
mod sensor;

pub use gpio::{FanActuator, GpioFan};
pub use model::{fan_pin_for_model, pi_model};
pub use sensor::{CpuTempSensor, TempSensor};
