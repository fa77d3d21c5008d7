//! Door monitor loop
//!
//! The single serialized writer for the inference engine. Hardware callbacks
//! and HTTP handlers enqueue inputs onto an unbounded channel and return
//! immediately; this task consumes them in order, classifies, applies the
//! engine, and appends to the event log. Nothing else ever touches
//! `EngineState`.
//!
//! Transient escalation uses one-shot timers tagged with the state version
//! in effect at scheduling time. A timer that fires after the state has
//! moved on fails the version check inside the engine and is discarded;
//! no explicit cancellation is needed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use ge_core::{
    clock, ClassifiedEvent, DaemonConfig, DoorState, EventClassifier, EventLog, PersistedEvent,
    SensorKind, StateEngine,
};

/// Inputs accepted by the monitor loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorInput {
    /// Debounced logical edge from a sensor pin
    Edge { kind: SensorKind, level: bool },
    /// Manual trigger request from the web boundary
    Trigger,
    /// Transient-escalation timer firing, tagged with the version captured
    /// at scheduling time
    Escalate { version: u64 },
}

/// Published view of the engine for read-side consumers (HTTP `/state`)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DoorSnapshot {
    pub state: DoorState,
    /// Epoch seconds at which the state was entered
    pub since: f64,
}

/// The serialized writer task
pub struct Monitor {
    engine: StateEngine,
    classifier: EventClassifier,
    log: Arc<EventLog>,
    door_time: Duration,
    inputs: mpsc::UnboundedReceiver<MonitorInput>,
    input_tx: mpsc::UnboundedSender<MonitorInput>,
    snapshot_tx: watch::Sender<DoorSnapshot>,
}

impl Monitor {
    /// Build a monitor seeded from the last persisted state.
    ///
    /// Returns the input sender shared by GPIO handlers, HTTP handlers and
    /// escalation timers, plus a watch receiver publishing the current state.
    pub fn new(
        seed: DoorState,
        seeded_at: f64,
        config: &DaemonConfig,
        log: Arc<EventLog>,
    ) -> (
        Self,
        mpsc::UnboundedSender<MonitorInput>,
        watch::Receiver<DoorSnapshot>,
    ) {
        let (input_tx, inputs) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(DoorSnapshot {
            state: seed,
            since: seeded_at,
        });
        let monitor = Self {
            engine: StateEngine::seeded(seed, seeded_at, config.door_time),
            classifier: EventClassifier::new(config.vibration_delta),
            log,
            door_time: Duration::from_secs_f64(config.door_time),
            inputs,
            input_tx: input_tx.clone(),
            snapshot_tx,
        };
        (monitor, input_tx, snapshot_rx)
    }

    /// Consume inputs until every sender is dropped
    pub async fn run(mut self) {
        info!(
            state = %self.engine.state().current,
            "Monitor loop started"
        );
        while let Some(input) = self.inputs.recv().await {
            self.handle(input).await;
        }
        info!("Monitor loop stopped");
    }

    async fn handle(&mut self, input: MonitorInput) {
        let now = clock::epoch_secs();
        match input {
            MonitorInput::Edge { kind, level } => {
                // Suppressed vibration repeats classify to nothing and leave
                // no trace in the log.
                if let Some(event) = self.classifier.classify(kind, level, now) {
                    self.append(event.record()).await;
                    self.apply(event, now).await;
                }
            }
            MonitorInput::Trigger => {
                let event = self.classifier.classify_trigger(now);
                self.append(event.record()).await;
                self.apply(event, now).await;
            }
            MonitorInput::Escalate { version } => {
                // A stale version is the designed supersession path, handled
                // silently inside the engine.
                if let Some(record) = self.engine.escalate(version, now) {
                    self.append(record).await;
                    self.publish_and_arm();
                }
            }
        }
    }

    async fn apply(&mut self, event: ClassifiedEvent, now: f64) {
        if let Some(record) = self.engine.apply(&event, now) {
            self.append(record).await;
            self.publish_and_arm();
        }
    }

    /// Publish the new state and, when it is transient, arm the one-shot
    /// escalation timer tagged with the current state version.
    fn publish_and_arm(&self) {
        let state = self.engine.state();
        self.snapshot_tx.send_replace(DoorSnapshot {
            state: state.current,
            since: state.entered_at,
        });

        if state.current.is_transient() {
            let version = state.state_version;
            let delay = self.door_time;
            let tx = self.input_tx.clone();
            debug!(version, ?delay, "Arming transient escalation timer");
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // The monitor may already be gone during shutdown.
                let _ = tx.send(MonitorInput::Escalate { version });
            });
        }
    }

    /// Append off the async executor. An append failure is reported but the
    /// in-memory transition stands; the durable trail diverging is an
    /// operator problem, not a reason to lose live state.
    async fn append(&self, record: PersistedEvent) {
        let log = self.log.clone();
        let result = tokio::task::spawn_blocking(move || {
            let outcome = log.append(&record);
            (record, outcome)
        })
        .await;
        match result {
            Ok((_, Ok(()))) => {}
            Ok((record, Err(e))) => {
                error!(name = %record.name, error = %e, "Failed to append event record");
            }
            Err(e) => {
                error!(error = %e, "Event log append task panicked");
            }
        }
    }
}
