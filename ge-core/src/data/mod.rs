//! Data types and configuration

pub mod config;
pub mod types;

pub use config::{default_config_path, load_config, save_config, DaemonConfig, DebounceConfig, PinConfig};
pub use types::{
    ClassifiedEvent, DoorState, EventKind, PersistedEvent, SensorKind, SensorReading,
    TriggerIntent,
};
