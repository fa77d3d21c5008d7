//! garage-envoy Core Library
//!
//! Infers the authoritative physical state of a garage door from noisy,
//! debounced position sensors and a manual trigger relay, and maintains a
//! durable append-only timeline of sensor and state events.
//!
//! # Module Structure
//!
//! - `data/` - Data types and configuration
//! - `engine/` - Event classification and state inference
//! - `hw/` - GPIO boundary trait and simulated backend
//! - `log` - Append-only JSONL event log
//!
//! # Example
//!
//! ```
//! use ge_core::{DoorState, EventClassifier, SensorKind, StateEngine};
//!
//! let mut classifier = EventClassifier::new(1.0);
//! let mut engine = StateEngine::new(15.0);
//!
//! if let Some(event) = classifier.classify(SensorKind::ClosedSensor, true, 0.0) {
//!     engine.apply(&event, 0.0);
//! }
//! assert_eq!(engine.state().current, DoorState::Closed);
//! ```

// Grouped modules
pub mod data;
pub mod engine;
pub mod hw;

// Standalone modules
pub mod clock;
pub mod constants;
pub mod log;

// Re-export primary types from data/
pub use data::{
    ClassifiedEvent, DaemonConfig, DebounceConfig, DoorState, EventKind, PersistedEvent,
    PinConfig, SensorKind, SensorReading, TriggerIntent,
};

// Re-export config functions from data/
pub use data::{default_config_path, load_config, save_config};

// Re-export engine types
pub use engine::{EngineState, EventClassifier, StateEngine};

// Re-export the hardware boundary
pub use hw::{EdgeHandler, Gpio, SimGpio};

// Re-export the event log
pub use log::EventLog;

// Re-export error types
pub use ge_error::{GarageError, Result};
