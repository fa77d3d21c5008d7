//! garage-envoy daemon (garaged)
//!
//! Watches a garage door through debounced GPIO sensors, infers the
//! canonical door state, and exposes a small web API plus a static UI.
//!
//! # Architecture
//! - **Sensors**: debounced reed switches at both ends of travel, plus an
//!   optional vibration sensor for disambiguating stalled doors
//! - **Monitor**: one serialized task owns all engine state; GPIO callbacks
//!   and HTTP handlers only enqueue inputs
//! - **Log**: append-only JSONL timeline, replayed at startup to seed the
//!   last known state
//! - **Web**: trigger endpoint, event queries, live state, static files
//!
//! Real hardware drivers are out of scope; the daemon runs on the simulated
//! GPIO backend, with console keys standing in for physical sensor edges.

mod monitor;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ge_core::{
    clock, load_config, DaemonConfig, DoorState, EventLog, Gpio, SensorKind, SimGpio,
};
use monitor::{Monitor, MonitorInput};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("garaged {} - garage door monitor daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    garaged [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Config file (default: /etc/garage-envoy/config.json,");
    eprintln!("                        then the per-user config directory)");
    eprintln!("    -d, --debug         Enable debug logging");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    GARAGE_LOG          Log filter (trace, debug, info, warn, error)");
    eprintln!();
    eprintln!("CONSOLE:");
    eprintln!("    o / c               Toggle the open / closed sensor");
    eprintln!("    v                   Emit a vibration pulse (when configured)");
}

/// Log to the systemd journal when it is available, stdout otherwise.
/// `-d/--debug` overrides the `GARAGE_LOG` filter.
fn init_logging(debug: bool) {
    let filter = if debug {
        "debug".to_string()
    } else {
        std::env::var("GARAGE_LOG").unwrap_or_else(|_| "info".to_string())
    };

    if std::path::Path::new("/run/systemd/journal/socket").exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&filter))
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&filter)
        .init();
}

/// Register the monitor's input channel as the handler for every configured
/// sensor pin. Handlers run in the GPIO dispatch context: enqueue and return.
fn subscribe_sensors(
    gpio: &SimGpio,
    config: &DaemonConfig,
    inputs: &mpsc::UnboundedSender<MonitorInput>,
) -> ge_core::Result<()> {
    let position = [
        (config.pins.open_sensor, SensorKind::OpenSensor),
        (config.pins.closed_sensor, SensorKind::ClosedSensor),
    ];
    for (pin, kind) in position {
        let tx = inputs.clone();
        gpio.subscribe(
            pin,
            config.debounce.position_ms,
            Box::new(move |_, level| {
                let _ = tx.send(MonitorInput::Edge { kind, level });
            }),
        )?;
    }

    if let Some(pin) = config.pins.vibration {
        let tx = inputs.clone();
        gpio.subscribe(
            pin,
            config.debounce.vibration_ms,
            Box::new(move |_, level| {
                let _ = tx.send(MonitorInput::Edge {
                    kind: SensorKind::VibrationSensor,
                    level,
                });
            }),
        )?;
        info!(pin, "Vibration pathway enabled");
    }
    Ok(())
}

/// Feed each position sensor's current level through the normal classify and
/// apply path, so the engine starts from live evidence instead of waiting
/// for the first edge.
fn prime_sensors(
    gpio: &SimGpio,
    config: &DaemonConfig,
    inputs: &mpsc::UnboundedSender<MonitorInput>,
) {
    let position = [
        (config.pins.open_sensor, SensorKind::OpenSensor),
        (config.pins.closed_sensor, SensorKind::ClosedSensor),
    ];
    for (pin, kind) in position {
        match gpio.read(pin) {
            Ok(level) => {
                let _ = inputs.send(MonitorInput::Edge { kind, level });
            }
            Err(e) => warn!(pin, error = %e, "Could not read initial sensor level"),
        }
    }
}

/// Map console keys onto simulated sensor edges, mirroring the bench setup
/// the real hardware replaces.
fn spawn_console_toggler(gpio: Arc<SimGpio>, config: &DaemonConfig) {
    let open_pin = config.pins.open_sensor;
    let closed_pin = config.pins.closed_sensor;
    let vibration_pin = config.pins.vibration;

    tokio::task::spawn_blocking(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for key in line.chars() {
                match key {
                    'o' => {
                        let level = gpio.toggle(open_pin);
                        debug!(level, "Console toggled open sensor");
                    }
                    'c' => {
                        let level = gpio.toggle(closed_pin);
                        debug!(level, "Console toggled closed sensor");
                    }
                    'v' => {
                        if let Some(pin) = vibration_pin {
                            gpio.toggle(pin);
                            debug!("Console vibration pulse");
                        } else {
                            warn!("No vibration pin configured");
                        }
                    }
                    _ => {}
                }
            }
        }
        debug!("Console input closed");
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse arguments before logging exists; errors go to stderr.
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut debug_logging = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                println!("garaged {}", VERSION);
                return Ok(());
            }
            "-d" | "--debug" => {
                debug_logging = true;
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    init_logging(debug_logging);
    info!("garaged {} starting", VERSION);

    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    info!(listen = %config.listen, "Configuration loaded");

    // Durable log when configured, in-memory timeline otherwise. Seed the
    // engine from the last persisted state record.
    let log = match &config.event_log {
        Some(path) => Arc::new(EventLog::open(path).context("opening event log")?),
        None => {
            info!("No event log configured, keeping events in memory");
            Arc::new(EventLog::in_memory())
        }
    };
    let (seed, seeded_at) = match log.last_state()? {
        Some(record) => (
            DoorState::from_name(&record.name).unwrap_or(DoorState::Unknown),
            record.time,
        ),
        None => (DoorState::Unknown, clock::epoch_secs()),
    };
    info!(state = %seed, "Seeded door state from event log");

    let (monitor, inputs, snapshot) = Monitor::new(seed, seeded_at, &config, log.clone());

    // Simulated GPIO backend; a hardware driver would implement the same
    // trait. The relay idles high (open contact).
    let gpio = Arc::new(SimGpio::new());
    gpio.write(config.pins.trigger, true)
        .context("initializing trigger relay")?;
    subscribe_sensors(&gpio, &config, &inputs).context("subscribing to sensor pins")?;

    ctrlc::set_handler(|| {
        info!("Received SIGINT/SIGTERM, shutting down");
        std::process::exit(0);
    })
    .context("installing signal handler")?;

    tokio::spawn(monitor.run());
    prime_sensors(&gpio, &config, &inputs);
    spawn_console_toggler(gpio.clone(), &config);

    let state = server::AppState {
        inputs,
        snapshot,
        log,
        gpio: gpio as Arc<dyn Gpio>,
        trigger_pin: config.pins.trigger,
    };
    server::run_server(&config.listen, &config.www_root, state).await
}
