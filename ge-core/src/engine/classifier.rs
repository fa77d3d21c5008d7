//! Sensor event classification
//!
//! Turns raw `(sensor, level)` pairs from the hardware boundary into the
//! semantic events the inference engine consumes. Position sensors pass
//! through directly; the vibration sensor is edge-triggered on a derived
//! "moving" boolean so repeated identical readings are suppressed.

use crate::data::{ClassifiedEvent, SensorKind, SensorReading, TriggerIntent};

/// Classifies debounced sensor edges and trigger requests.
///
/// Position-sensor classification is stateless. The vibration pathway keeps
/// the timestamp of the last motion pulse and the last derived `moving`
/// value, and reports only flips of that value.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    vibration_delta: f64,
    last_vibration_at: Option<f64>,
    moving: bool,
}

impl EventClassifier {
    /// Create a classifier with the given vibration window in seconds
    pub fn new(vibration_delta: f64) -> Self {
        Self {
            vibration_delta,
            last_vibration_at: None,
            moving: false,
        }
    }

    /// Classify a debounced logical edge from a sensor.
    ///
    /// Returns `None` when the edge carries no new information (a vibration
    /// pulse that does not flip the derived moving state).
    pub fn classify(&mut self, kind: SensorKind, level: bool, now: f64) -> Option<ClassifiedEvent> {
        match kind {
            SensorKind::OpenSensor | SensorKind::ClosedSensor => {
                Some(ClassifiedEvent::Sensor(SensorReading {
                    kind,
                    asserted: level,
                    timestamp: now,
                }))
            }
            // Any debounced edge on the vibration pin counts as a motion
            // pulse; the electrical level itself carries no information.
            SensorKind::VibrationSensor => self.classify_vibration_pulse(now),
        }
    }

    /// Classify a manual trigger request
    pub fn classify_trigger(&self, now: f64) -> ClassifiedEvent {
        ClassifiedEvent::Trigger(TriggerIntent { timestamp: now })
    }

    fn classify_vibration_pulse(&mut self, now: f64) -> Option<ClassifiedEvent> {
        let moving = match self.last_vibration_at {
            Some(last) => (now - last) < self.vibration_delta,
            None => false,
        };
        self.last_vibration_at = Some(now);

        if moving == self.moving {
            return None;
        }
        self.moving = moving;
        Some(ClassifiedEvent::Sensor(SensorReading {
            kind: SensorKind::VibrationSensor,
            asserted: moving,
            timestamp: now,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asserted(event: Option<ClassifiedEvent>) -> Option<bool> {
        match event {
            Some(ClassifiedEvent::Sensor(reading)) => Some(reading.asserted),
            _ => None,
        }
    }

    #[test]
    fn test_position_sensors_pass_through() {
        let mut classifier = EventClassifier::new(1.0);
        let event = classifier.classify(SensorKind::OpenSensor, true, 5.0);
        match event {
            Some(ClassifiedEvent::Sensor(reading)) => {
                assert_eq!(reading.kind, SensorKind::OpenSensor);
                assert!(reading.asserted);
                assert_eq!(reading.timestamp, 5.0);
            }
            other => panic!("unexpected classification: {:?}", other),
        }
        // Deasserted edges pass through too
        assert_eq!(
            asserted(classifier.classify(SensorKind::ClosedSensor, false, 5.1)),
            Some(false)
        );
    }

    #[test]
    fn test_first_vibration_pulse_is_silent() {
        // No prior pulse: moving computes false, matching the initial value,
        // so nothing is emitted.
        let mut classifier = EventClassifier::new(1.0);
        assert_eq!(classifier.classify(SensorKind::VibrationSensor, true, 0.0), None);
    }

    #[test]
    fn test_vibration_emits_only_on_flips() {
        let mut classifier = EventClassifier::new(1.0);

        // Prime with one pulse, then a quick second pulse flips to moving.
        assert_eq!(classifier.classify(SensorKind::VibrationSensor, true, 0.0), None);
        assert_eq!(
            asserted(classifier.classify(SensorKind::VibrationSensor, true, 0.4)),
            Some(true)
        );

        // Further pulses inside the window are suppressed.
        assert_eq!(classifier.classify(SensorKind::VibrationSensor, true, 0.9), None);
        assert_eq!(classifier.classify(SensorKind::VibrationSensor, false, 1.3), None);

        // A pulse after a long gap flips back to stopped.
        assert_eq!(
            asserted(classifier.classify(SensorKind::VibrationSensor, true, 5.0)),
            Some(false)
        );
    }

    #[test]
    fn test_vibration_window_boundary() {
        let mut classifier = EventClassifier::new(1.0);
        classifier.classify(SensorKind::VibrationSensor, true, 0.0);
        // Exactly delta apart is not "moving" (strict less-than).
        assert_eq!(classifier.classify(SensorKind::VibrationSensor, true, 1.0), None);
    }

    #[test]
    fn test_trigger_classification() {
        let classifier = EventClassifier::new(1.0);
        match classifier.classify_trigger(7.5) {
            ClassifiedEvent::Trigger(intent) => assert_eq!(intent.timestamp, 7.5),
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}
