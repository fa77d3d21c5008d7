//! Constants and configuration defaults for garage-envoy
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Never use magic numbers in other files - add them here first.

/// System paths
pub mod paths {
    use std::path::PathBuf;

    /// System-wide configuration directory
    pub const CONFIG_DIR: &str = "/etc/garage-envoy";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Default event log location
    pub const EVENT_LOG: &str = "/var/lib/garage-envoy/events.log";

    /// Default static web UI root
    pub const WWW_ROOT: &str = "/usr/share/garage-envoy/www";

    /// Per-user configuration directory (fallback when the system config
    /// is absent, e.g. when running unprivileged during development)
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("garage-envoy"))
    }
}

/// Default GPIO pin assignments
///
/// Logical (BCM) pin numbers for the Raspberry Pi model A/B. These are only
/// defaults; deployments remap them through the `pins` config section.
pub mod pins {
    /// Relay output that pulses the door opener
    pub const TRIGGER: u8 = 17;

    /// Reed switch at the fully-open end of travel
    pub const OPEN_SENSOR: u8 = 25;

    /// Reed switch at the fully-closed end of travel
    pub const CLOSED_SENSOR: u8 = 24;
}

/// Timing defaults
pub mod timing {
    /// Max time the door takes to travel between rest positions, in seconds.
    /// Used to escalate a transient state that never resolved.
    pub const DOOR_TIME_SECS: f64 = 15.0;

    /// Window after the last vibration pulse during which the door counts
    /// as moving, in seconds.
    pub const VIBRATION_DELTA_SECS: f64 = 1.0;

    /// Debounce interval for the position reed switches
    pub const POSITION_DEBOUNCE_MS: u64 = 100;

    /// Debounce interval for the vibration sensor. Coarser debounce would
    /// mask the short pulses being detected.
    pub const VIBRATION_DEBOUNCE_MS: u64 = 20;

    /// How long the trigger relay is held low when actuating the door
    pub const TRIGGER_PULSE_MS: u64 = 200;
}

/// Network defaults
pub mod net {
    /// Default HTTP listen address
    pub const LISTEN_ADDR: &str = "0.0.0.0:8000";

    /// Cache-Control header applied to static web UI files (one year)
    pub const STATIC_CACHE_CONTROL: &str = "max-age=31557600";
}
