//! Position report intake: one pipeline that validates a raw report,
//! commits it to the fleet, derives rider-facing figures, and publishes
//! the result. Both the HTTP and socket entry points call into here so
//! the two paths can never drift apart.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::fleet::{FleetRegistry, Telemetry};
use crate::gateway::{BroadcastGateway, BusEvent};
use crate::geo::{self, GeoPoint};

/// Rejection reasons for a position report. Messages are the exact strings
/// riders and drivers see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("Ônibus não encontrado")]
    BusNotFound,
    #[error("Coordenadas inválidas")]
    InvalidCoordinates,
}

/// Everything derived from one accepted report. This same payload is
/// returned to the reporter and broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    pub bus_id: String,
    pub current_position: GeoPoint,
    pub speed: f64,
    pub distance_to_initial: f64,
    pub distance_to_final: f64,
    pub last_update: String,
}

// GPS firmware sends numbers, some phone clients send numeric strings.
// Accept either, but only if the whole token parses.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn field(report: &Value, name: &str) -> Option<f64> {
    report.get(name).and_then(loose_number)
}

/// Applies one raw position report to the fleet.
///
/// Checks run in order: the bus must exist, then both coordinates must be
/// present, numeric, finite, and within latitude ±90 / longitude ±180.
/// Speed is advisory and never rejects a report; anything missing, not
/// numeric, or negative becomes 0. On success the registry is updated,
/// the update is broadcast, and the same payload is returned.
pub fn report_position(
    fleet: &mut FleetRegistry,
    gateway: &BroadcastGateway,
    bus_id: &str,
    report: &Value,
) -> Result<TrackingUpdate, TrackingError> {
    let bus = fleet.get(bus_id).ok_or(TrackingError::BusNotFound)?;

    let latitude = field(report, "latitude").ok_or(TrackingError::InvalidCoordinates)?;
    let longitude = field(report, "longitude").ok_or(TrackingError::InvalidCoordinates)?;
    if !latitude.is_finite()
        || !longitude.is_finite()
        || !(-90.0..=90.0).contains(&latitude)
        || !(-180.0..=180.0).contains(&longitude)
    {
        return Err(TrackingError::InvalidCoordinates);
    }
    let speed = field(report, "speed")
        .filter(|s| s.is_finite())
        .map_or(0.0, |s| s.max(0.0));

    let position = GeoPoint::new(latitude, longitude);
    let telemetry = Telemetry {
        position,
        recorded_at: Utc::now(),
    };
    let update = TrackingUpdate {
        bus_id: bus.id.clone(),
        current_position: position,
        speed,
        distance_to_initial: geo::road_distance(position, bus.initial_point),
        distance_to_final: geo::road_distance(position, bus.final_point),
        last_update: telemetry.display_time(),
    };

    fleet
        .apply_update(bus_id, telemetry, speed)
        .ok_or(TrackingError::BusNotFound)?;
    gateway.publish(BusEvent::PositionUpdate(update.clone()));
    debug!(
        "accepted position for {}: ({}, {}) at {} km/h",
        update.bus_id, latitude, longitude, speed
    );
    Ok(update)
}
