//! Two-state hysteresis engine for on/off fan control
//!
//! # How It Works
//!
//! The fan is a relay, not a PWM device, so control is a two-state machine:
//! off until the temperature reaches `threshold_on`, then on until it falls
//! back to `threshold_off`. Readings strictly between the two thresholds
//! change nothing; that band is what keeps the relay from chattering around
//! a single trip point.
//!
//! The engine is pure state: it never touches hardware or the clock, which
//! keeps it trivially unit-testable. The control loop feeds it readings and
//! acts on the transitions it reports.

/// Fan relay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanState {
    #[default]
    Off,
    On,
}

impl FanState {
    pub fn is_on(self) -> bool {
        matches!(self, FanState::On)
    }
}

/// On/off decision engine with a hysteresis band between the two thresholds.
///
/// Thresholds come straight from configuration and are not validated here:
/// a reversed pair (`threshold_off >= threshold_on`) makes the relay toggle
/// every cycle for readings inside the overlap.
#[derive(Debug, Clone)]
pub struct FanHysteresis {
    threshold_on: f32,
    threshold_off: f32,
    state: FanState,
}

impl FanHysteresis {
    /// Create an engine in the `Off` state
    pub fn new(threshold_on: f32, threshold_off: f32) -> Self {
        Self {
            threshold_on,
            threshold_off,
            state: FanState::Off,
        }
    }

    /// Replace the thresholds without touching the current state. Called once
    /// per cycle so live settings changes apply without a restart.
    pub fn set_thresholds(&mut self, threshold_on: f32, threshold_off: f32) {
        self.threshold_on = threshold_on;
        self.threshold_off = threshold_off;
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Feed one temperature reading.
    ///
    /// Returns `Some(new_state)` when the reading crossed a threshold and the
    /// state changed, `None` inside the hysteresis band. The caller actuates
    /// hardware only on `Some`, avoiding a relay write every cycle.
    pub fn update(&mut self, temperature_c: f32) -> Option<FanState> {
        match self.state {
            FanState::Off if temperature_c >= self.threshold_on => {
                self.state = FanState::On;
                Some(FanState::On)
            }
            FanState::On if temperature_c <= self.threshold_off => {
                self.state = FanState::Off;
                Some(FanState::Off)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off() {
        let engine = FanHysteresis::new(65.0, 55.0);
        assert_eq!(engine.state(), FanState::Off);
    }

    #[test]
    fn transitions_only_at_crossing_points() {
        let mut engine = FanHysteresis::new(65.0, 55.0);

        let readings = [50.0, 66.0, 60.0, 56.0, 54.0];
        let expected = [
            FanState::Off,
            FanState::On,
            FanState::On,
            FanState::On,
            FanState::Off,
        ];

        for (reading, want) in readings.iter().zip(expected) {
            engine.update(*reading);
            assert_eq!(engine.state(), want, "after reading {}", reading);
        }
    }

    #[test]
    fn exact_thresholds_trip() {
        let mut engine = FanHysteresis::new(65.0, 55.0);
        assert_eq!(engine.update(65.0), Some(FanState::On));
        assert_eq!(engine.update(55.0), Some(FanState::Off));
    }

    #[test]
    fn band_readings_report_no_transition() {
        let mut engine = FanHysteresis::new(65.0, 55.0);
        assert_eq!(engine.update(60.0), None);
        engine.update(70.0);
        assert_eq!(engine.update(60.0), None);
        assert!(engine.is_on());
    }

    #[test]
    fn threshold_change_applies_to_next_reading() {
        let mut engine = FanHysteresis::new(65.0, 55.0);
        assert_eq!(engine.update(62.0), None);
        engine.set_thresholds(60.0, 50.0);
        assert_eq!(engine.update(62.0), Some(FanState::On));
    }

    #[test]
    fn reversed_thresholds_chatter_every_cycle() {
        // threshold_off >= threshold_on is a misconfiguration the engine does
        // not guard against: a reading inside the overlap flips the state on
        // every cycle.
        let mut engine = FanHysteresis::new(55.0, 65.0);
        assert_eq!(engine.update(60.0), Some(FanState::On));
        assert_eq!(engine.update(60.0), Some(FanState::Off));
        assert_eq!(engine.update(60.0), Some(FanState::On));
    }
}
