//! Events pushed to live viewers and to the notification feed.

use crate::model::{ActorId, DeliveryId, DeliveryStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one committed status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub delivery_id: DeliveryId,
    pub previous_status: DeliveryStatus,
    pub new_status: DeliveryStatus,
    /// Delivery version this event produced. The N-th transition carries version N.
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

/// Live position report from the assigned agent. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub delivery_id: DeliveryId,
    pub agent_id: ActorId,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// One item of a viewer's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    Status(StatusEvent),
    Location(LocationUpdate),
}

impl TrackingEvent {
    pub fn delivery_id(&self) -> &DeliveryId {
        match self {
            TrackingEvent::Status(event) => &event.delivery_id,
            TrackingEvent::Location(update) => &update.delivery_id,
        }
    }

    /// The status event, if this is one.
    pub fn as_status(&self) -> Option<&StatusEvent> {
        match self {
            TrackingEvent::Status(event) => Some(event),
            TrackingEvent::Location(_) => None,
        }
    }

    /// Encodes the event as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
