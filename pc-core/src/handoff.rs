//! Latest-sample hand-off between the control loop and a poller
//!
//! Only the most recent reading matters to a status display, so the channel
//! is a single slot with replace-on-publish semantics: the producer never
//! blocks, and a slow consumer sees the newest sample rather than a backlog.

use parking_lot::Mutex;

/// Snapshot published once per controller cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalSample {
    /// CPU temperature in °C
    pub temperature_c: f32,
    /// Relay state after this cycle's decision
    pub fan_on: bool,
    /// Poll interval the controller is currently running at, in seconds
    pub interval_secs: u64,
}

/// Single-slot, last-write-wins hand-off cell.
///
/// `publish` always succeeds and overwrites any unconsumed sample;
/// `try_consume` takes the latest sample or reports nothing new. An empty
/// poll is a normal outcome, not an error.
#[derive(Debug, Default)]
pub struct SampleSlot {
    slot: Mutex<Option<ThermalSample>>,
}

impl SampleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents with `sample`. Never blocks the publisher.
    pub fn publish(&self, sample: ThermalSample) {
        *self.slot.lock() = Some(sample);
    }

    /// Take the latest unconsumed sample, leaving the slot empty.
    pub fn try_consume(&self) -> Option<ThermalSample> {
        self.slot.lock().take()
    }
}
