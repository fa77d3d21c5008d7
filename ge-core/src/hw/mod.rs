//! Hardware boundary
//!
//! The daemon talks to GPIO hardware exclusively through the [`Gpio`] trait.
//! The hardware side owns electrical concerns: reading and writing pin
//! levels, debouncing raw noise, and dispatching one callback per debounced
//! logical transition. Everything above this boundary is pin-number agnostic.
//!
//! Real drivers (e.g. a Raspberry Pi backend) are out of scope; development
//! and tests use the [`sim::SimGpio`] backend.

pub mod sim;

pub use sim::SimGpio;

use ge_error::Result;

/// Callback invoked once per debounced logical transition of a pin
pub type EdgeHandler = Box<dyn Fn(u8, bool) + Send + Sync>;

/// GPIO collaborator boundary.
///
/// Handlers registered with [`Gpio::subscribe`] may be invoked from an
/// interrupt-style context: they must hand off via a non-blocking enqueue
/// and return immediately, never performing I/O or sleeping.
pub trait Gpio: Send + Sync {
    /// Read the current logical level of a pin
    fn read(&self, pin: u8) -> Result<bool>;

    /// Drive an output pin
    fn write(&self, pin: u8, level: bool) -> Result<()>;

    /// Register a handler for debounced logical transitions of an input pin.
    ///
    /// `debounce_ms` is pin-specific: position reed switches want a coarse
    /// window, a vibration sensor a short one so its pulses survive.
    fn subscribe(&self, pin: u8, debounce_ms: u64, handler: EdgeHandler) -> Result<()>;
}
