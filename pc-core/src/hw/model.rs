//! Raspberry Pi model detection
//!
//! The device-tree model string ("Raspberry Pi 4 Model B Rev 1.2") tells the
//! generations apart; the first integer in it is the model number. Pi 4 and
//! later route the fan header to a different BCM pin.

use regex::Regex;
use std::fs;
use std::path::Path;

use crate::constants::{gpio, paths};

/// Model number from the device-tree, or `None` off-Pi or when the file has
/// no number in it.
pub fn pi_model() -> Option<u32> {
    pi_model_from(Path::new(paths::DEVICE_TREE_MODEL))
}

fn pi_model_from(path: &Path) -> Option<u32> {
    let data = fs::read_to_string(path).ok()?;
    let digits = Regex::new(r"[0-9]+").ok()?;
    digits.find(&data).and_then(|m| m.as_str().parse().ok())
}

/// BCM pin for the fan relay on the given model
pub fn fan_pin_for_model(model: Option<u32>) -> u32 {
    match model {
        Some(m) if m >= gpio::PI4_MODEL => gpio::FAN_PIN_PI4,
        _ => gpio::FAN_PIN_LEGACY,
    }
}
