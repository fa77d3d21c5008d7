//! HTTP boundary
//!
//! Thin glue over the monitor loop and the event log: trigger intents go in,
//! log queries and the live state come out, and everything else falls back to
//! the static web UI. No handler here touches engine state directly; writes
//! go through the monitor's input channel, reads through the published
//! snapshot and the log's snapshot-at-open read path.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, warn};

use ge_core::constants::{net, timing};
use ge_core::{EventKind, EventLog, Gpio, PersistedEvent};

use crate::monitor::{DoorSnapshot, MonitorInput};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub inputs: mpsc::UnboundedSender<MonitorInput>,
    pub snapshot: watch::Receiver<DoorSnapshot>,
    pub log: Arc<EventLog>,
    pub gpio: Arc<dyn Gpio>,
    pub trigger_pin: u8,
}

#[derive(Debug, Default, Deserialize)]
struct EventsQuery {
    /// Max records to return; 0 or absent means the whole log
    #[serde(default)]
    n: Option<usize>,
    /// Record kind filter: "sensor" or "state"
    #[serde(default, alias = "type")]
    t: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    events: Vec<PersistedEvent>,
}

/// `POST /_trigger`: feed a trigger intent to the engine and pulse the relay.
///
/// The pulse runs on its own task so the ~200ms relay hold never delays the
/// monitor loop or this response.
async fn post_trigger(State(state): State<AppState>) -> StatusCode {
    if state.inputs.send(MonitorInput::Trigger).is_err() {
        error!("Monitor loop is gone, dropping trigger request");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    spawn_trigger_pulse(state.gpio.clone(), state.trigger_pin);
    StatusCode::NO_CONTENT
}

/// Pulse the relay pin low and back high to actuate the door opener
fn spawn_trigger_pulse(gpio: Arc<dyn Gpio>, pin: u8) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = gpio.write(pin, false) {
            warn!(pin, error = %e, "Failed to close trigger relay");
            return;
        }
        tokio::time::sleep(Duration::from_millis(timing::TRIGGER_PULSE_MS)).await;
        if let Err(e) = gpio.write(pin, true) {
            warn!(pin, error = %e, "Failed to reopen trigger relay");
        }
    })
}

/// `GET /events` (and `/history`): the log's last `n` matching records,
/// oldest first.
async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    // An unrecognized filter matches nothing rather than erroring, the same
    // as filtering on a kind the log never contains.
    let filter = match query.t.as_deref() {
        Some(name) => match EventKind::from_name(name) {
            Some(kind) => Some(kind),
            None => return Json(EventsResponse { events: Vec::new() }).into_response(),
        },
        None => None,
    };
    let n = query.n.unwrap_or(0);

    let log = state.log.clone();
    match tokio::task::spawn_blocking(move || log.read_last(n, filter)).await {
        Ok(Ok(events)) => Json(EventsResponse { events }).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to read event log");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!(error = %e, "Event log read task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /state`: the live inferred door state and when it was entered
async fn get_state(State(state): State<AppState>) -> Json<DoorSnapshot> {
    Json(*state.snapshot.borrow())
}

/// Build the router: the API routes plus the static web UI fallback
pub fn router(state: AppState, www_root: &Path) -> Router {
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(net::STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(www_root));

    Router::new()
        .route("/_trigger", post(post_trigger))
        .route("/events", get(get_events))
        .route("/history", get(get_events))
        .route("/state", get(get_state))
        .fallback_service(static_files)
        .with_state(state)
}

/// Bind the listen address and serve until the process exits
pub async fn run_server(listen: &str, www_root: &Path, state: AppState) -> anyhow::Result<()> {
    let app = router(state, www_root);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
