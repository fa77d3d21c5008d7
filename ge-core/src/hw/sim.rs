//! Simulated GPIO backend
//!
//! In-memory pin map with subscription dispatch and per-pin debounce,
//! standing in for real hardware during development and tests. External
//! stimulus arrives through [`SimGpio::set_level`] / [`SimGpio::toggle`]
//! (the daemon wires these to console keys, the way the original bench
//! setup toggled sensors from the keyboard).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use super::{EdgeHandler, Gpio};
use ge_error::{GarageError, Result};

struct Subscription {
    debounce: Duration,
    handler: EdgeHandler,
    last_delivery: Option<Instant>,
}

/// Simulated GPIO chip
#[derive(Default)]
pub struct SimGpio {
    levels: Mutex<HashMap<u8, bool>>,
    subscriptions: Mutex<HashMap<u8, Subscription>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an external level change on an input pin, dispatching to the
    /// pin's subscriber unless the edge falls inside its debounce window.
    pub fn set_level(&self, pin: u8, level: bool) {
        let changed = {
            let mut levels = self.levels.lock();
            levels.insert(pin, level) != Some(level)
        };
        if !changed {
            return;
        }

        let mut subscriptions = self.subscriptions.lock();
        if let Some(sub) = subscriptions.get_mut(&pin) {
            let now = Instant::now();
            if let Some(last) = sub.last_delivery {
                if now.duration_since(last) < sub.debounce {
                    trace!(pin, level, "Suppressing edge inside debounce window");
                    return;
                }
            }
            sub.last_delivery = Some(now);
            (sub.handler)(pin, level);
        }
    }

    /// Flip a pin's level, returning the new level
    pub fn toggle(&self, pin: u8) -> bool {
        let level = !self.levels.lock().get(&pin).copied().unwrap_or(false);
        self.set_level(pin, level);
        level
    }
}

impl Gpio for SimGpio {
    fn read(&self, pin: u8) -> Result<bool> {
        self.levels
            .lock()
            .get(&pin)
            .copied()
            .ok_or(GarageError::UnknownPin(pin))
    }

    fn write(&self, pin: u8, level: bool) -> Result<()> {
        // Output pins have no subscribers; just record the level.
        self.levels.lock().insert(pin, level);
        Ok(())
    }

    fn subscribe(&self, pin: u8, debounce_ms: u64, handler: EdgeHandler) -> Result<()> {
        self.levels.lock().entry(pin).or_insert(false);
        self.subscriptions.lock().insert(
            pin,
            Subscription {
                debounce: Duration::from_millis(debounce_ms),
                handler,
                last_delivery: None,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_read_write_round_trip() {
        let gpio = SimGpio::new();
        gpio.write(17, true).unwrap();
        assert!(gpio.read(17).unwrap());
        gpio.write(17, false).unwrap();
        assert!(!gpio.read(17).unwrap());
    }

    #[test]
    fn test_unknown_pin_read_is_an_error() {
        let gpio = SimGpio::new();
        assert!(matches!(gpio.read(42), Err(GarageError::UnknownPin(42))));
    }

    #[test]
    fn test_subscribe_delivers_edges() {
        let gpio = SimGpio::new();
        let edges: Arc<Mutex<Vec<(u8, bool)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = edges.clone();
        gpio.subscribe(25, 0, Box::new(move |pin, level| sink.lock().push((pin, level))))
            .unwrap();

        gpio.set_level(25, true);
        gpio.set_level(25, true); // no edge, no delivery
        gpio.set_level(25, false);

        assert_eq!(*edges.lock(), vec![(25, true), (25, false)]);
    }

    #[test]
    fn test_debounce_suppresses_rapid_edges() {
        let gpio = SimGpio::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        gpio.subscribe(24, 100, Box::new(move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

        gpio.toggle(24);
        gpio.toggle(24); // bounces inside the window
        gpio.toggle(24);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        std::thread::sleep(Duration::from_millis(120));
        gpio.toggle(24);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_writes_do_not_dispatch() {
        let gpio = SimGpio::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        gpio.subscribe(17, 0, Box::new(move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

        gpio.write(17, true).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
