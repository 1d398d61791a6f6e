//! Fan Control Loop
//!
//! Polls the CPU temperature on the configured interval, applies the
//! hysteresis thresholds, and publishes the latest sample for the status
//! poller.
//!
//! Failures are contained per cycle: a sensor that cannot be read keeps the
//! previous fan state and the previously published sample; a relay write that
//! fails is logged and monitoring continues. Thresholds and the interval are
//! re-read from the config store every cycle, so a settings save takes effect
//! on the next cycle without a restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use pc_core::{
    ConfigStore, FanActuator, FanHysteresis, FanSettings, SampleSlot, TempSensor, ThermalSample,
};

/// Consecutive failures of one kind before repeat log lines are suppressed
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Shared handle for stopping and waking the control loop
#[derive(Debug, Default)]
pub struct ControlState {
    shutdown: AtomicBool,
    wake: Notify,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to exit. Wakes it from its end-of-cycle sleep so shutdown
    /// does not wait out the full interval.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// The thermal controller: owns the fan state, the sensor, and the relay.
///
/// Constructed exactly once by the daemon's composition root; correctness
/// comes from only ever building one, not from an enforced singleton.
pub struct ControlLoop<S: TempSensor, A: FanActuator> {
    store: ConfigStore,
    sensor: S,
    actuator: A,
    slot: Arc<SampleSlot>,
    engine: FanHysteresis,
    settings: FanSettings,
    config_failures: u32,
    sensor_failures: u32,
}

impl<S: TempSensor, A: FanActuator> ControlLoop<S, A> {
    pub fn new(store: ConfigStore, sensor: S, actuator: A, slot: Arc<SampleSlot>) -> Self {
        let settings = store.fan_settings().unwrap_or_else(|e| {
            warn!("could not read fan settings, starting with defaults: {}", e);
            FanSettings::default()
        });
        let engine = FanHysteresis::new(settings.threshold_on, settings.threshold_off);

        Self {
            store,
            sensor,
            actuator,
            slot,
            engine,
            settings,
            config_failures: 0,
            sensor_failures: 0,
        }
    }

    /// Sleep duration until the next cycle. Re-derived every cycle so an
    /// interval change applies to the very next sleep.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.interval.max(1))
    }

    /// One controller cycle: refresh config, sample, decide, actuate on
    /// transition, publish.
    pub fn cycle(&mut self) {
        self.refresh_settings();

        let temp = match self.sensor.read_temp() {
            Ok(t) if t.is_finite() => {
                if self.sensor_failures > 0 {
                    debug!(
                        "temperature sensor recovered after {} failures",
                        self.sensor_failures
                    );
                    self.sensor_failures = 0;
                }
                t
            }
            Ok(t) => {
                self.note_sensor_failure(&format!("non-finite reading {}", t));
                return;
            }
            Err(e) => {
                self.note_sensor_failure(&e.to_string());
                return;
            }
        };

        if let Some(new_state) = self.engine.update(temp) {
            info!(
                temp_c = temp,
                fan_on = new_state.is_on(),
                "temperature crossed threshold"
            );
            if let Err(e) = self.actuator.set_power(new_state.is_on()) {
                // Actuation failure must never stop monitoring
                warn!("fan relay write failed: {}", e);
            }
        } else {
            debug!(temp_c = temp, fan_on = self.engine.is_on(), "steady");
        }

        self.slot.publish(ThermalSample {
            temperature_c: temp,
            fan_on: self.engine.is_on(),
            interval_secs: self.settings.interval,
        });
    }

    /// Re-read the `fan` section so live settings changes apply next cycle.
    /// On failure the previous thresholds stay in force.
    fn refresh_settings(&mut self) {
        match self.store.fan_settings() {
            Ok(settings) => {
                if self.config_failures > 0 {
                    debug!(
                        "config readable again after {} failures",
                        self.config_failures
                    );
                    self.config_failures = 0;
                }
                self.engine
                    .set_thresholds(settings.threshold_on, settings.threshold_off);
                self.settings = settings;
            }
            Err(e) => {
                self.config_failures += 1;
                if self.config_failures == 1 || self.config_failures % MAX_CONSECUTIVE_ERRORS == 0
                {
                    warn!(
                        "failed to read fan settings (attempt {}): {} - keeping previous thresholds",
                        self.config_failures, e
                    );
                }
            }
        }
    }

    fn note_sensor_failure(&mut self, reason: &str) {
        self.sensor_failures += 1;
        if self.sensor_failures == 1 || self.sensor_failures % MAX_CONSECUTIVE_ERRORS == 0 {
            warn!(
                "temperature read failed (attempt {}): {} - keeping previous fan state",
                self.sensor_failures, reason
            );
        }
    }

    /// Run until shutdown is requested. Strictly one cycle at a time; the
    /// only suspension point is the end-of-cycle sleep.
    pub async fn run(mut self, state: Arc<ControlState>) {
        info!("fan control loop starting");

        loop {
            if state.is_shutdown() {
                break;
            }

            self.cycle();

            tokio::select! {
                _ = tokio::time::sleep(self.interval()) => {}
                _ = state.wake.notified() => {
                    debug!("control loop woken early");
                }
            }
        }

        info!("fan control loop stopped");
    }
}
