//! HTTP and WebSocket surface.
//!
//! GET  /buses                              every bus with its live state
//! GET  /tracking/all                       same listing, tracking-page alias
//! POST /tracking/{bus_id}/location         driver position report
//! GET  /tracking/{bus_id}/eta/{direction}  distance and time to one endpoint
//! GET  /health                             liveness probe
//! GET  /ws                                 stream of accepted position updates

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::fleet::FleetRegistry;
use crate::gateway::BroadcastGateway;
use crate::snapshot::{self, BusSnapshot, Direction, LegMetric};
use crate::tracking::{self, TrackingError, TrackingUpdate};

/// Shared state behind every route: the fleet under a lock, and the
/// gateway that fans accepted updates out to socket subscribers.
pub struct AppState {
    fleet: RwLock<FleetRegistry>,
    gateway: BroadcastGateway,
}

impl AppState {
    pub fn new(fleet: FleetRegistry) -> Self {
        Self {
            fleet: RwLock::new(fleet),
            gateway: BroadcastGateway::new(100),
        }
    }
}

#[derive(Debug, Serialize)]
struct BusListResponse {
    success: bool,
    data: Vec<BusSnapshot>,
}

#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
    message: String,
    data: TrackingUpdate,
}

#[derive(Debug, Serialize)]
struct LegMetricResponse {
    success: bool,
    data: LegMetric,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

fn error_reply(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: message.to_string(),
        }),
    )
}

fn tracking_error_reply(err: &TrackingError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        TrackingError::BusNotFound => StatusCode::NOT_FOUND,
        TrackingError::InvalidCoordinates => StatusCode::BAD_REQUEST,
    };
    error_reply(status, &err.to_string())
}

async fn list_buses(State(state): State<Arc<AppState>>) -> Json<BusListResponse> {
    let fleet = state.fleet.read().await;
    Json(BusListResponse {
        success: true,
        data: snapshot::compose_all(&fleet),
    })
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(bus_id): Path<String>,
    Json(report): Json<Value>,
) -> Result<Json<UpdateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut fleet = state.fleet.write().await;
    match tracking::report_position(&mut fleet, &state.gateway, &bus_id, &report) {
        Ok(update) => Ok(Json(UpdateResponse {
            success: true,
            message: "Localização atualizada".to_string(),
            data: update,
        })),
        Err(err) => Err(tracking_error_reply(&err)),
    }
}

async fn leg_eta(
    State(state): State<Arc<AppState>>,
    Path((bus_id, direction)): Path<(String, String)>,
) -> Result<Json<LegMetricResponse>, (StatusCode, Json<ErrorResponse>)> {
    let direction = parse_direction(&direction)
        .ok_or_else(|| error_reply(StatusCode::BAD_REQUEST, "Direção inválida"))?;
    let fleet = state.fleet.read().await;
    let bus = fleet
        .get(&bus_id)
        .ok_or_else(|| tracking_error_reply(&TrackingError::BusNotFound))?;
    Ok(Json(LegMetricResponse {
        success: true,
        data: snapshot::route_leg_metric(bus, direction),
    }))
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token {
        "toRodeio" => Some(Direction::ToFinal),
        "toFCA" => Some(Direction::ToInitial),
        _ => None,
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.gateway.subscribe();

    info!("websocket client connected");

    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = serde_json::to_string(&event).unwrap_or_default();
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let push_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        // Only text frames carry reports; pings and pongs pass through.
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Text(text) = message {
                apply_push_report(&push_state, &text).await;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    info!("websocket client disconnected");
}

/// Pushed reports are fire-and-forget: a frame that is not a well-formed
/// location event, or fails validation, is logged and dropped without a
/// reply frame.
async fn apply_push_report(state: &AppState, text: &str) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!("dropping unparseable socket frame: {}", err);
            return;
        }
    };
    if frame.get("event").and_then(Value::as_str) != Some("bus-location-update") {
        debug!("ignoring socket frame without a location event");
        return;
    }
    let report = match frame.get("data") {
        Some(report) => report,
        None => {
            debug!("ignoring location event without data");
            return;
        }
    };
    let bus_id = match report.get("busId").and_then(Value::as_str) {
        Some(id) => id,
        None => {
            debug!("ignoring location event without a busId");
            return;
        }
    };

    let mut fleet = state.fleet.write().await;
    if let Err(err) = tracking::report_position(&mut fleet, &state.gateway, bus_id, report) {
        debug!("dropping push report for {}: {}", bus_id, err);
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/buses", get(list_buses))
        .route("/tracking/all", get(list_buses))
        .route("/tracking/{bus_id}/location", post(update_location))
        .route("/tracking/{bus_id}/eta/{direction}", get(leg_eta))
        .route("/health", get(health))
        .route("/ws", get(ws_upgrade))
        .layer(cors)
        .with_state(state)
}
