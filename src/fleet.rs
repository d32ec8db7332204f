//! The shuttle fleet: static route descriptions plus the live telemetry
//! reported for each vehicle.

use chrono::{DateTime, Utc};
use chrono_tz::America::Sao_Paulo;

use crate::geo::GeoPoint;

const FCA_UNICAMP: GeoPoint = GeoPoint::new(-22.5565835, -47.4216307);
const ESPACO_RODEIO: GeoPoint = GeoPoint::new(-22.619852, -47.377685);

/// One accepted position report: where the bus was and when we heard it.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub position: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

impl Telemetry {
    /// Wall-clock rendering of `recorded_at` for riders, in São Paulo time.
    pub fn display_time(&self) -> String {
        self.recorded_at
            .with_timezone(&Sao_Paulo)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string()
    }
}

/// A shuttle on the FCA ↔ Rodeio line. Identity and endpoints are fixed at
/// startup; telemetry and speed change as reports arrive.
#[derive(Debug, Clone)]
pub struct Bus {
    pub id: String,
    pub name: String,
    pub route: String,
    pub initial_point: GeoPoint,
    pub final_point: GeoPoint,
    pub telemetry: Option<Telemetry>,
    pub speed: f64,
}

impl Bus {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            route: "FCA UNICAMP → Espaço Rodeio → FCA UNICAMP".to_string(),
            initial_point: FCA_UNICAMP,
            final_point: ESPACO_RODEIO,
            telemetry: None,
            speed: 0.0,
        }
    }
}

/// Owns every tracked bus. All reads and updates go through here; callers
/// decide how access is synchronized.
#[derive(Debug)]
pub struct FleetRegistry {
    buses: Vec<Bus>,
}

impl FleetRegistry {
    pub fn new(buses: Vec<Bus>) -> Self {
        Self { buses }
    }

    pub fn get(&self, id: &str) -> Option<&Bus> {
        self.buses.iter().find(|bus| bus.id == id)
    }

    /// Buses in registration order, for stable listings.
    pub fn all(&self) -> &[Bus] {
        &self.buses
    }

    /// Replaces the live state of `id` and returns the updated bus, or
    /// `None` when no such bus is registered. Static fields never change.
    pub fn apply_update(&mut self, id: &str, telemetry: Telemetry, speed: f64) -> Option<&Bus> {
        let bus = self.buses.iter_mut().find(|bus| bus.id == id)?;
        bus.telemetry = Some(telemetry);
        bus.speed = speed;
        Some(&*bus)
    }
}

/// The two shuttles that run the line, with no telemetry yet.
pub fn startup_fleet() -> FleetRegistry {
    FleetRegistry::new(vec![
        Bus::new("bus-001", "Linha FCA ↔ Rodeio 001"),
        Bus::new("bus-002", "Linha FCA ↔ Rodeio 002"),
    ])
}
