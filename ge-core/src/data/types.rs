//! Core data types for door state inference
//!
//! These types mirror the persisted event vocabulary: sensor events are raw
//! facts from the hardware boundary, state events are the engine's inferences.

use serde::{Deserialize, Serialize};

/// Canonical door state
///
/// Exactly one value is current at any instant. `HalfOpen`/`HalfClosed` are
/// inferred "stuck partway" states reached only through time-based escalation
/// or vibration-stop inference, never directly from a position sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoorState {
    Open,
    Closed,
    Opening,
    Closing,
    HalfOpen,
    HalfClosed,
    Unknown,
}

impl DoorState {
    /// Name used in persisted `state` records
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Open => "open",
            DoorState::Closed => "closed",
            DoorState::Opening => "opening",
            DoorState::Closing => "closing",
            DoorState::HalfOpen => "half-open",
            DoorState::HalfClosed => "half-closed",
            DoorState::Unknown => "unknown",
        }
    }

    /// Parse a persisted state name; `None` for unrecognized names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open" => Some(DoorState::Open),
            "closed" => Some(DoorState::Closed),
            "opening" => Some(DoorState::Opening),
            "closing" => Some(DoorState::Closing),
            "half-open" => Some(DoorState::HalfOpen),
            "half-closed" => Some(DoorState::HalfClosed),
            "unknown" => Some(DoorState::Unknown),
            _ => None,
        }
    }

    /// Whether the door is between rest positions
    pub fn is_transient(&self) -> bool {
        matches!(self, DoorState::Opening | DoorState::Closing)
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of physical sensor reporting an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    OpenSensor,
    ClosedSensor,
    VibrationSensor,
}

impl SensorKind {
    /// Name used in persisted `sensor` records
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::OpenSensor => "open",
            SensorKind::ClosedSensor => "closed",
            SensorKind::VibrationSensor => "vibration",
        }
    }
}

/// A debounced logical edge from a position or vibration sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub asserted: bool,
    /// Epoch seconds
    pub timestamp: f64,
}

/// A request to actuate the door. Carries no position information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerIntent {
    /// Epoch seconds
    pub timestamp: f64,
}

/// What the inference engine actually consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifiedEvent {
    Sensor(SensorReading),
    Trigger(TriggerIntent),
}

impl ClassifiedEvent {
    /// The raw-fact record this event persists as.
    ///
    /// Sensor and trigger events are logged unconditionally, whether or not
    /// they change the inferred door state.
    pub fn record(&self) -> PersistedEvent {
        match self {
            ClassifiedEvent::Sensor(reading) => PersistedEvent {
                time: reading.timestamp,
                kind: EventKind::Sensor,
                name: reading.kind.as_str().to_string(),
                value: Some(reading.asserted),
            },
            ClassifiedEvent::Trigger(intent) => PersistedEvent {
                time: intent.timestamp,
                kind: EventKind::Sensor,
                name: "trigger".to_string(),
                value: None,
            },
        }
    }
}

/// Persisted record category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sensor,
    State,
}

impl EventKind {
    /// Parse a query-string filter value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sensor" => Some(EventKind::Sensor),
            "state" => Some(EventKind::State),
            _ => None,
        }
    }
}

/// One durable log record. A line once written is never edited or removed.
///
/// Serialized as `{"time": <epoch secs>, "type": "sensor"|"state",
/// "name": <string>, "value": <bool|null>}`, one record per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEvent {
    pub time: f64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub name: String,
    #[serde(default)]
    pub value: Option<bool>,
}

impl PersistedEvent {
    /// Build the `state` record for an accepted transition
    pub fn state(time: f64, state: DoorState) -> Self {
        Self {
            time,
            kind: EventKind::State,
            name: state.as_str().to_string(),
            value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_state_names_round_trip() {
        for state in [
            DoorState::Open,
            DoorState::Closed,
            DoorState::Opening,
            DoorState::Closing,
            DoorState::HalfOpen,
            DoorState::HalfClosed,
            DoorState::Unknown,
        ] {
            assert_eq!(DoorState::from_name(state.as_str()), Some(state));
        }
        assert_eq!(DoorState::from_name("ajar"), None);
    }

    #[test]
    fn test_transient_states() {
        assert!(DoorState::Opening.is_transient());
        assert!(DoorState::Closing.is_transient());
        assert!(!DoorState::HalfOpen.is_transient());
        assert!(!DoorState::Unknown.is_transient());
    }

    #[test]
    fn test_sensor_record_format() {
        let event = ClassifiedEvent::Sensor(SensorReading {
            kind: SensorKind::OpenSensor,
            asserted: true,
            timestamp: 1000.5,
        });
        let json = serde_json::to_string(&event.record()).unwrap();
        assert_eq!(
            json,
            r#"{"time":1000.5,"type":"sensor","name":"open","value":true}"#
        );
    }

    #[test]
    fn test_trigger_record_has_null_value() {
        let event = ClassifiedEvent::Trigger(TriggerIntent { timestamp: 2.0 });
        let json = serde_json::to_string(&event.record()).unwrap();
        assert_eq!(
            json,
            r#"{"time":2.0,"type":"sensor","name":"trigger","value":null}"#
        );
    }

    #[test]
    fn test_state_record_format() {
        let record = PersistedEvent::state(3.25, DoorState::HalfClosed);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"time":3.25,"type":"state","name":"half-closed","value":null}"#
        );
    }

    #[test]
    fn test_record_deserialize_without_value() {
        // Hand-written or legacy lines may omit the value key entirely.
        let record: PersistedEvent =
            serde_json::from_str(r#"{"time":1.0,"type":"state","name":"open"}"#).unwrap();
        assert_eq!(record.kind, EventKind::State);
        assert_eq!(record.value, None);
    }
}
