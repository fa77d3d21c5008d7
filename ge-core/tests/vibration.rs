//! Vibration-assisted inference when the position sensors are silent.
//!
//! Drives the classifier and engine together the way the daemon's writer
//! does, with explicit timestamps.

use ge_core::{DoorState, EventClassifier, SensorKind, StateEngine};

const DOOR_TIME: f64 = 15.0;
const VIBRATION_DELTA: f64 = 1.0;

fn feed(
    classifier: &mut EventClassifier,
    engine: &mut StateEngine,
    kind: SensorKind,
    level: bool,
    at: f64,
) {
    if let Some(event) = classifier.classify(kind, level, at) {
        engine.apply(&event, at);
    }
}

#[test]
fn repeated_pulses_while_stuck_emit_one_transition() {
    let mut classifier = EventClassifier::new(VIBRATION_DELTA);
    let mut engine = StateEngine::seeded(DoorState::HalfOpen, 0.0, DOOR_TIME);

    // Prime the pulse history so the next pulse lands inside the window.
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, -0.5);
    assert_eq!(engine.state().current, DoorState::HalfOpen);

    // First pulse flips the derived moving value: the stuck door is in
    // motion again and heads back the other way.
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 0.0);
    assert_eq!(engine.state().current, DoorState::Closing);
    assert_eq!(engine.state().state_version, 1);

    // Follow-up pulses still compute moving=true, so nothing is emitted and
    // the state does not change again.
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 0.4);
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 0.9);
    assert_eq!(engine.state().current, DoorState::Closing);
    assert_eq!(engine.state().state_version, 1);
}

#[test]
fn stall_and_recovery_cycle() {
    let mut classifier = EventClassifier::new(VIBRATION_DELTA);
    let mut engine = StateEngine::seeded(DoorState::Unknown, 0.0, DOOR_TIME);

    // The door leaves the closed position and starts vibrating.
    feed(&mut classifier, &mut engine, SensorKind::ClosedSensor, true, 0.0);
    feed(&mut classifier, &mut engine, SensorKind::ClosedSensor, false, 1.0);
    assert_eq!(engine.state().current, DoorState::Opening);

    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 1.2);
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 1.6);
    // Motion while already opening confirms nothing new.
    assert_eq!(engine.state().current, DoorState::Opening);

    // The pulses stop: the next one arrives long after the window and flips
    // moving back to false, parking the door half-open.
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 6.0);
    assert_eq!(engine.state().current, DoorState::HalfOpen);

    // Motion resumes; the door reverses toward closed and the closed sensor
    // eventually confirms it.
    feed(&mut classifier, &mut engine, SensorKind::VibrationSensor, true, 6.3);
    assert_eq!(engine.state().current, DoorState::Closing);
    feed(&mut classifier, &mut engine, SensorKind::ClosedSensor, true, 12.0);
    assert_eq!(engine.state().current, DoorState::Closed);
}
