//! Read-side views over the fleet: full bus snapshots for listings and
//! per-leg distance/time figures for riders waiting at an endpoint.

use serde::Serialize;

use crate::fleet::{Bus, FleetRegistry};
use crate::geo::{self, GeoPoint, TravelEstimate};

/// One bus as shown to riders. Static route data is always present;
/// live fields are `null` until the first report, and the distance
/// fields are omitted entirely so clients can tell "never heard from"
/// apart from "at distance zero".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusSnapshot {
    pub id: String,
    pub name: String,
    pub route: String,
    pub initial_point: GeoPoint,
    pub final_point: GeoPoint,
    pub current_position: Option<GeoPoint>,
    pub speed: f64,
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_initial: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_final: Option<f64>,
}

pub fn compose_one(bus: &Bus) -> BusSnapshot {
    let telemetry = bus.telemetry.as_ref();
    BusSnapshot {
        id: bus.id.clone(),
        name: bus.name.clone(),
        route: bus.route.clone(),
        initial_point: bus.initial_point,
        final_point: bus.final_point,
        current_position: telemetry.map(|t| t.position),
        speed: bus.speed,
        last_update: telemetry.map(|t| t.display_time()),
        distance_to_initial: telemetry.map(|t| geo::road_distance(t.position, bus.initial_point)),
        distance_to_final: telemetry.map(|t| geo::road_distance(t.position, bus.final_point)),
    }
}

/// Snapshots for every bus, in registration order.
pub fn compose_all(fleet: &FleetRegistry) -> Vec<BusSnapshot> {
    fleet.all().iter().map(compose_one).collect()
}

/// Which endpoint of the line a rider is waiting at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToFinal,
    ToInitial,
}

/// Distance and travel time from a bus to one endpoint of its route.
/// `distance` is `null` until the bus has reported a position; `time`
/// renders as the sentinel whenever no estimate is possible.
#[derive(Debug, Clone, Serialize)]
pub struct LegMetric {
    pub distance: Option<f64>,
    pub time: TravelEstimate,
}

pub fn route_leg_metric(bus: &Bus, direction: Direction) -> LegMetric {
    let target = match direction {
        Direction::ToFinal => bus.final_point,
        Direction::ToInitial => bus.initial_point,
    };
    match bus.telemetry.as_ref() {
        Some(telemetry) => {
            let distance = geo::road_distance(telemetry.position, target);
            LegMetric {
                distance: Some(distance),
                time: geo::estimated_travel_time(distance, bus.speed),
            }
        }
        None => LegMetric {
            distance: None,
            time: TravelEstimate::Indeterminate,
        },
    }
}
