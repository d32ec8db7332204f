//! Fan-out of accepted position updates to live subscribers.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::tracking::TrackingUpdate;

/// Events pushed to subscribers, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum BusEvent {
    #[serde(rename = "bus-position-update")]
    PositionUpdate(TrackingUpdate),
}

/// Broadcast channel wrapper. Publishing never blocks and never fails:
/// with no subscribers the event is simply dropped, and slow subscribers
/// lag rather than stall the sender.
#[derive(Debug, Clone)]
pub struct BroadcastGateway {
    tx: broadcast::Sender<BusEvent>,
}

impl BroadcastGateway {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: BusEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn sample_update() -> TrackingUpdate {
        TrackingUpdate {
            bus_id: "bus-001".to_string(),
            current_position: GeoPoint::new(-22.58, -47.40),
            speed: 38.5,
            distance_to_initial: 4.28,
            distance_to_final: 6.24,
            last_update: "09/03/2025, 11:05:07".to_string(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let gateway = BroadcastGateway::new(4);
        gateway.publish(BusEvent::PositionUpdate(sample_update()));
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let gateway = BroadcastGateway::new(4);
        let mut rx = gateway.subscribe();

        let mut first = sample_update();
        first.speed = 10.0;
        let mut second = sample_update();
        second.speed = 20.0;
        gateway.publish(BusEvent::PositionUpdate(first));
        gateway.publish(BusEvent::PositionUpdate(second));

        let BusEvent::PositionUpdate(a) = rx.try_recv().unwrap();
        let BusEvent::PositionUpdate(b) = rx.try_recv().unwrap();
        assert_eq!(a.speed, 10.0);
        assert_eq!(b.speed, 20.0);
    }

    #[test]
    fn events_serialize_with_the_socket_envelope() {
        let value = serde_json::to_value(BusEvent::PositionUpdate(sample_update())).unwrap();
        assert_eq!(value["event"], "bus-position-update");
        assert_eq!(value["data"]["busId"], "bus-001");
        assert_eq!(value["data"]["distanceToInitial"], 4.28);
        assert_eq!(value["data"]["lastUpdate"], "09/03/2025, 11:05:07");
    }
}
