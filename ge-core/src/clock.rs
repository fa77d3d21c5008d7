//! Wall-clock access
//!
//! The engine and classifier take timestamps as plain arguments so tests can
//! drive them deterministically; this is the one place the daemon reads the
//! real clock.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// This is the unit every persisted record uses; it must never be mixed
/// with milliseconds across a deployment.
pub fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
