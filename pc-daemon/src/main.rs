//! PiControl Daemon (picontrold)
//!
//! Background service for Raspberry Pi fan control. Owns the thermal control
//! loop and a status poller; the web UI process reads the same config file
//! and issues settings saves against it.
//!
//! # Composition
//! - One `ConfigStore` handle, created here and passed down (no globals)
//! - One `ControlLoop`, spawned as a background task
//! - A status poller consuming the sample hand-off once per second
//! - SIGINT/SIGTERM request a cooperative shutdown checked every cycle

mod fan_control;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use fan_control::{ControlLoop, ControlState};
use pc_core::{fan_pin_for_model, pi_model, ConfigStore, CpuTempSensor, GpioFan, SampleSlot};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PID File Management
// ============================================================================

fn get_pid_file_path() -> &'static str {
    if Path::new("/run").exists() {
        "/run/picontrold.pid"
    } else {
        "/var/run/picontrold.pid"
    }
}

/// Write the PID file, refusing to start when another live instance holds it.
/// Two controllers fighting over the same GPIO pin is worse than no PID file,
/// so a stale file is removed but a live one is fatal.
fn write_pid_file() -> io::Result<()> {
    use std::io::Write;

    let path = get_pid_file_path();

    if Path::new(path).exists() {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(old_pid) = content.trim().parse::<i32>() {
                // SAFETY: kill with signal 0 only checks process existence.
                if unsafe { libc::kill(old_pid, 0) } == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("Another instance is running (PID {})", old_pid),
                    ));
                }
            }
        }
        // Stale PID file, remove it
        let _ = std::fs::remove_file(path);
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;

    writeln!(file, "{}", std::process::id())?;
    file.sync_all()?;

    debug!("PID file written: {}", path);
    Ok(())
}

fn remove_pid_file() {
    let path = get_pid_file_path();
    if Path::new(path).exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove PID file: {}", e);
        }
    }
}

// ============================================================================
// CLI
// ============================================================================

fn print_help() {
    eprintln!("picontrold {} - PiControl fan control daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    picontrold [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Config file path (default: per-user XDG location)");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    PICONTROL_LOG       Log level (trace, debug, info, warn, error)");
    eprintln!("    PICONTROL_CONFIG    Config file path (overridden by --config)");
}

fn print_version() {
    println!("picontrold {}", VERSION);
}

// ============================================================================
// Logging
// ============================================================================

/// Log to the systemd journal when it is available, stdout otherwise.
fn init_logging(log_level: &str) -> bool {
    let mut use_journald = Path::new("/run/systemd/journal/socket").exists();

    if use_journald {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(log_level))
                    .init();
            }
            Err(e) => {
                eprintln!(
                    "Failed to create journald layer: {}, falling back to stdout",
                    e
                );
                use_journald = false;
                tracing_subscriber::fmt()
                    .with_target(false)
                    .with_level(true)
                    .with_env_filter(log_level)
                    .init();
            }
        }
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .with_env_filter(log_level)
            .init();
    }

    use_journald
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse arguments before logging so -h/-v stay quiet
    let args: Vec<String> = std::env::args().collect();
    let mut config_arg: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                print_version();
                return Ok(());
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_arg = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let log_level = std::env::var("PICONTROL_LOG").unwrap_or_else(|_| "info".to_string());
    let use_journald = init_logging(&log_level);

    info!("STARTUP: picontrold {} starting", VERSION);
    info!(
        "STARTUP: Logging to {}",
        if use_journald { "systemd journal" } else { "stdout" }
    );

    // Refuse to run beside a live instance; a PID file we merely cannot
    // write (unprivileged dev runs) is not fatal.
    match write_pid_file() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            warn!("Could not write PID file: {}", e);
        }
    }

    // Config store: explicit handle, passed to every consumer
    let store = match config_arg {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::at_default_path(),
    };
    info!("STARTUP: Config file: {}", store.path().display());

    // A corrupt or unwritable config is an operator problem, not something
    // to paper over at startup.
    if let Err(e) = store.load() {
        error!("Failed to load configuration: {}", e);
        remove_pid_file();
        std::process::exit(1);
    }
    if let Ok(version) = store.version() {
        info!("STARTUP: Config version: {}", version);
    }

    let model = pi_model();
    let pin = fan_pin_for_model(model);
    match model {
        Some(m) => info!("STARTUP: Raspberry Pi {} detected, fan on BCM {}", m, pin),
        None => info!("STARTUP: No Pi model detected, fan on BCM {}", pin),
    }

    let sensor = CpuTempSensor::new();
    let actuator = GpioFan::new(pin);
    let slot = Arc::new(SampleSlot::new());
    let state = Arc::new(ControlState::new());

    // Signal handler requests cooperative shutdown; the loop checks the flag
    // at the top of every cycle.
    {
        let state = Arc::clone(&state);
        if let Err(e) = ctrlc::set_handler(move || {
            info!("SIGNAL: Received SIGINT/SIGTERM - initiating shutdown");
            state.request_shutdown();
        }) {
            warn!("Failed to set signal handler: {}", e);
        }
    }

    let control = ControlLoop::new(store, sensor, actuator, Arc::clone(&slot));
    let control_handle = tokio::spawn(control.run(Arc::clone(&state)));
    info!("Fan control loop started");

    // Status poller: the stand-in for the web UI reader. An empty poll is a
    // normal outcome, not an error.
    while !state.is_shutdown() {
        if let Some(sample) = slot.try_consume() {
            info!(
                temp_c = sample.temperature_c,
                fan_on = sample.fan_on,
                interval_s = sample.interval_secs,
                "STATUS"
            );
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    control_handle.await?;
    remove_pid_file();
    info!("SHUTDOWN: picontrold terminated gracefully");

    Ok(())
}
