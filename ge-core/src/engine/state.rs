//! Door state inference engine
//!
//! The deterministic transition function that combines the previous/current
//! state, a classified event, and elapsed time into the next canonical door
//! state. Transition rules are evaluated in priority order:
//!
//! 1. Open sensor asserted      -> `Open`
//! 2. Open sensor deasserted    -> `Closing`
//! 3. Closed sensor asserted    -> `Closed`
//! 4. Closed sensor deasserted  -> `Opening`
//! 5. Trigger, disambiguated by the *previous* state (the current state may
//!    already be a half-state inferred from the trigger itself)
//! 6. Vibration resumed while stuck partway -> back to a transient state
//! 7. Vibration stopped while transient     -> half-state
//! 8. Transient older than the door travel time -> half-state (timer path)
//!
//! Unrecognized combinations are silent no-ops. There is deliberately no
//! conflict detection between independent position sensors: near-simultaneous
//! edges are applied in arrival order and the later one wins.

use serde::Serialize;
use tracing::debug;

use crate::data::{ClassifiedEvent, DoorState, PersistedEvent, SensorKind};

/// The engine's complete mutable state.
///
/// `state_version` increments on every accepted transition and is the
/// staleness token for transient-escalation timers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineState {
    pub current: DoorState,
    pub previous: DoorState,
    /// Epoch seconds at which `current` was entered
    pub entered_at: f64,
    pub state_version: u64,
}

/// Deterministic door-state inference.
///
/// Not reentrant: all calls must come from a single serialized writer. The
/// daemon owns one instance inside its monitor task; tests drive it directly
/// with explicit timestamps.
#[derive(Debug, Clone)]
pub struct StateEngine {
    state: EngineState,
    door_time: f64,
}

impl StateEngine {
    /// Create an engine with no prior evidence
    pub fn new(door_time: f64) -> Self {
        Self::seeded(DoorState::Unknown, 0.0, door_time)
    }

    /// Create an engine seeded from the last persisted state record
    pub fn seeded(current: DoorState, entered_at: f64, door_time: f64) -> Self {
        Self {
            state: EngineState {
                current,
                previous: DoorState::Unknown,
                entered_at,
                state_version: 0,
            },
            door_time,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Apply a classified event, returning the `state` record to persist if
    /// the event produced a transition.
    ///
    /// Total over all event kinds; combinations with no defined response
    /// leave the state untouched and return `None`.
    pub fn apply(&mut self, event: &ClassifiedEvent, now: f64) -> Option<PersistedEvent> {
        let next = self.infer(event)?;
        self.accept(next, now)
    }

    /// Timer-driven escalation of a transient state (rule 8).
    ///
    /// `version` is the state version captured when the timer was scheduled;
    /// a mismatch means the state has moved on and the firing is stale. Stale
    /// firings are the designed supersession mechanism, not an error.
    pub fn escalate(&mut self, version: u64, now: f64) -> Option<PersistedEvent> {
        if version != self.state.state_version {
            debug!(
                version,
                current = self.state.state_version,
                "Discarding stale escalation timer"
            );
            return None;
        }
        if now - self.state.entered_at < self.door_time {
            return None;
        }
        let next = match self.state.current {
            DoorState::Opening => DoorState::HalfOpen,
            DoorState::Closing => DoorState::HalfClosed,
            _ => return None,
        };
        self.accept(next, now)
    }

    /// Rules 1-7. Pure with respect to the engine state.
    fn infer(&self, event: &ClassifiedEvent) -> Option<DoorState> {
        match event {
            ClassifiedEvent::Sensor(reading) => match (reading.kind, reading.asserted) {
                (SensorKind::OpenSensor, true) => Some(DoorState::Open),
                (SensorKind::OpenSensor, false) => Some(DoorState::Closing),
                (SensorKind::ClosedSensor, true) => Some(DoorState::Closed),
                (SensorKind::ClosedSensor, false) => Some(DoorState::Opening),
                // Motion resumed: a stuck door is moving again, away from
                // wherever it stalled.
                (SensorKind::VibrationSensor, true) => match self.state.current {
                    DoorState::HalfOpen => Some(DoorState::Closing),
                    DoorState::HalfClosed => Some(DoorState::Opening),
                    _ => None,
                },
                // Motion stopped mid-travel: the door is stuck partway.
                (SensorKind::VibrationSensor, false) => match self.state.current {
                    DoorState::Opening => Some(DoorState::HalfOpen),
                    DoorState::Closing => Some(DoorState::HalfClosed),
                    _ => None,
                },
            },
            // The trigger carries no position evidence; the previous state
            // tells us which way the door was last headed.
            ClassifiedEvent::Trigger(_) => match self.state.previous {
                DoorState::Closing | DoorState::HalfClosed => Some(DoorState::Opening),
                DoorState::Opening | DoorState::HalfOpen => Some(DoorState::Closing),
                _ => None,
            },
        }
    }

    /// Commit a computed next state. Idempotent: a transition to the state
    /// already in effect is dropped so no duplicate consecutive `state`
    /// records are ever produced.
    fn accept(&mut self, next: DoorState, now: f64) -> Option<PersistedEvent> {
        if next == self.state.current {
            return None;
        }
        self.state.previous = self.state.current;
        self.state.current = next;
        self.state.entered_at = now;
        self.state.state_version += 1;
        debug!(
            state = %next,
            previous = %self.state.previous,
            version = self.state.state_version,
            "Door state transition"
        );
        Some(PersistedEvent::state(now, next))
    }
}
