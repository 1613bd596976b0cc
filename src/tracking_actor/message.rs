//! Mailbox protocol of a hub shard.

use super::TrackingError;
use crate::model::{Delivery, DeliveryId, LocationUpdate, StatusEvent, TrackingEvent, ViewerId};
use serde::Serialize;
use std::ops::Add;
use tokio::sync::{mpsc, oneshot};

pub enum HubRequest {
    Subscribe {
        delivery_id: DeliveryId,
        viewer: ViewerId,
        respond_to: oneshot::Sender<Result<Registration, TrackingError>>,
    },
    /// Removes the viewer whatever registration it holds. Replies whether one was removed.
    Unsubscribe {
        delivery_id: DeliveryId,
        viewer: ViewerId,
        respond_to: oneshot::Sender<bool>,
    },
    /// Removes the viewer only if it still holds registration `session`.
    Release {
        delivery_id: DeliveryId,
        viewer: ViewerId,
        session: u64,
    },
    Publish(StatusEvent),
    Location(LocationUpdate),
    Stats {
        respond_to: oneshot::Sender<HubStats>,
    },
}

/// What a shard hands back for a successful subscribe.
#[derive(Debug)]
pub struct Registration {
    pub snapshot: Delivery,
    pub session: u64,
    pub events: mpsc::Receiver<TrackingEvent>,
}

/// Size of the subscriber registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Deliveries with at least one live viewer.
    pub deliveries: usize,
    pub viewers: usize,
}

impl Add for HubStats {
    type Output = HubStats;

    fn add(self, other: HubStats) -> HubStats {
        HubStats {
            deliveries: self.deliveries + other.deliveries,
            viewers: self.viewers + other.viewers,
        }
    }
}
