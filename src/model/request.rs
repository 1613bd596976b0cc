//! Inbound request payloads.

use crate::model::{ActorId, DeliveryId, DeliveryStatus};
use serde::{Deserialize, Serialize};

/// A request to move a delivery to another status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub delivery_id: DeliveryId,
    pub requested_status: DeliveryStatus,
    pub actor_id: ActorId,
    /// Status the caller last observed. When set, the transition only commits if the
    /// delivery is still in this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<DeliveryStatus>,
}

impl TransitionRequest {
    pub fn new(
        delivery_id: impl Into<DeliveryId>,
        requested_status: DeliveryStatus,
        actor_id: impl Into<ActorId>,
    ) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            requested_status,
            actor_id: actor_id.into(),
            expected_status: None,
        }
    }

    /// Pins the status the transition starts from.
    pub fn expecting(mut self, status: DeliveryStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}
