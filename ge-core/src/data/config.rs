//! Daemon configuration
//!
//! Persistent configuration stored as JSON, system-wide in
//! /etc/garage-envoy/config.json with a per-user fallback. Every field is
//! defaulted so a missing or partial file always yields a runnable config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{net, paths, pins, timing};
use ge_error::{GarageError, Result};

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaemonConfig {
    /// Max door travel time in seconds; drives transient escalation
    pub door_time: f64,

    /// Vibration "still moving" window in seconds
    pub vibration_delta: f64,

    /// Sensor-to-pin mapping
    pub pins: PinConfig,

    /// Per-sensor debounce intervals
    pub debounce: DebounceConfig,

    /// Append-only event log location; `null` keeps events in memory only
    pub event_log: Option<PathBuf>,

    /// HTTP listen address, e.g. "0.0.0.0:8000"
    pub listen: String,

    /// Static web UI root
    pub www_root: PathBuf,
}

/// GPIO pin assignments (logical/BCM numbering)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PinConfig {
    pub trigger: u8,
    pub open_sensor: u8,
    pub closed_sensor: u8,
    /// Optional vibration sensor; `null` disables the vibration pathway
    pub vibration: Option<u8>,
}

/// Debounce intervals in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DebounceConfig {
    pub position_ms: u64,
    pub vibration_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            door_time: timing::DOOR_TIME_SECS,
            vibration_delta: timing::VIBRATION_DELTA_SECS,
            pins: PinConfig::default(),
            debounce: DebounceConfig::default(),
            event_log: Some(PathBuf::from(paths::EVENT_LOG)),
            listen: net::LISTEN_ADDR.to_string(),
            www_root: PathBuf::from(paths::WWW_ROOT),
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            trigger: pins::TRIGGER,
            open_sensor: pins::OPEN_SENSOR,
            closed_sensor: pins::CLOSED_SENSOR,
            vibration: None,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            position_ms: timing::POSITION_DEBOUNCE_MS,
            vibration_ms: timing::VIBRATION_DEBOUNCE_MS,
        }
    }
}

impl DaemonConfig {
    /// Validate configured values, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        if !self.door_time.is_finite() || self.door_time <= 0.0 {
            return Err(GarageError::InvalidConfig {
                field: "doorTime".to_string(),
                reason: "must be a positive number of seconds".to_string(),
            });
        }

        if !self.vibration_delta.is_finite() || self.vibration_delta <= 0.0 {
            return Err(GarageError::InvalidConfig {
                field: "vibrationDelta".to_string(),
                reason: "must be a positive number of seconds".to_string(),
            });
        }

        let mut assigned = vec![
            self.pins.trigger,
            self.pins.open_sensor,
            self.pins.closed_sensor,
        ];
        if let Some(vibration) = self.pins.vibration {
            assigned.push(vibration);
        }
        assigned.sort_unstable();
        assigned.dedup();
        let expected = 3 + usize::from(self.pins.vibration.is_some());
        if assigned.len() != expected {
            return Err(GarageError::InvalidConfig {
                field: "pins".to_string(),
                reason: "pin assignments must be distinct".to_string(),
            });
        }

        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(GarageError::InvalidConfig {
                field: "listen".to_string(),
                reason: format!("not a valid socket address: {}", self.listen),
            });
        }

        Ok(())
    }
}

/// Resolve the config file path: system dir first, then the user fallback
pub fn default_config_path() -> PathBuf {
    let system = Path::new(paths::CONFIG_DIR).join(paths::CONFIG_FILE);
    if system.exists() {
        return system;
    }
    paths::user_config_dir()
        .map(|dir| dir.join(paths::CONFIG_FILE))
        .unwrap_or(system)
}

/// Load configuration from an explicit path, or from the default locations.
///
/// An explicit path must exist; a missing default file yields the built-in
/// defaults so a fresh install runs without any configuration.
pub fn load_config(path: Option<&Path>) -> Result<DaemonConfig> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    if !path.exists() {
        if required {
            return Err(GarageError::FileNotFound(path));
        }
        info!("No config file at {:?}, using defaults", path);
        return Ok(DaemonConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(|e| GarageError::FileRead {
        path: path.clone(),
        source: e,
    })?;

    let config: DaemonConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration as pretty-printed JSON, creating parent directories
pub fn save_config(config: &DaemonConfig, path: &Path) -> Result<()> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GarageError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|e| GarageError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DaemonConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.door_time, 15.0);
        assert_eq!(config.vibration_delta, 1.0);
        assert_eq!(config.pins.vibration, None);
        assert!(config.event_log.is_some());
    }

    #[test]
    fn test_null_event_log_disables_persistence() {
        let config: DaemonConfig = serde_json::from_str(r#"{"eventLog": null}"#).unwrap();
        assert_eq!(config.event_log, None);
    }

    #[test]
    fn test_recognized_options_parse() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{"doorTime": 20.5, "vibrationDelta": 0.5, "pins": {"vibration": 23}}"#,
        )
        .unwrap();
        assert_eq!(config.door_time, 20.5);
        assert_eq!(config.vibration_delta, 0.5);
        assert_eq!(config.pins.vibration, Some(23));
        // Unspecified fields keep their defaults
        assert_eq!(config.pins.trigger, 17);
        assert_eq!(config.listen, "0.0.0.0:8000");
    }

    #[test]
    fn test_rejects_nonpositive_door_time() {
        let config = DaemonConfig {
            door_time: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GarageError::InvalidConfig { field, .. }) if field == "doorTime"
        ));
    }

    #[test]
    fn test_rejects_duplicate_pins() {
        let config = DaemonConfig {
            pins: PinConfig {
                trigger: 17,
                open_sensor: 17,
                closed_sensor: 24,
                vibration: None,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        let config = DaemonConfig {
            listen: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GarageError::InvalidConfig { field, .. }) if field == "listen"
        ));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DaemonConfig::default();
        config.door_time = 30.0;
        config.pins.vibration = Some(23);
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.door_time, 30.0);
        assert_eq!(loaded.pins.vibration, Some(23));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(
            load_config(Some(&path)),
            Err(GarageError::FileNotFound(_))
        ));
    }
}
