//! A single order's fulfilment record.
//!
//! # Actor Framework
//! Deliveries are persisted by the store actor, which wraps them in a
//! [`DeliveryRecord`](crate::delivery_actor::DeliveryRecord) together with their audit trail.
//! Only `Delivery::advance` changes the status, and only the store actor calls it.

use crate::model::{ActorId, DeliveryId, DeliveryStatus, OrderId, StatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub order_id: OrderId,
    /// The agent assigned when the delivery was created. Never changes.
    pub agent_id: ActorId,
    pub status: DeliveryStatus,
    pub address: String,
    pub fee: f64,
    pub estimated_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Number of committed transitions. A fresh delivery is at version 0.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment payload supplied by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCreate {
    pub order_id: OrderId,
    pub agent_id: ActorId,
    pub address: String,
    pub fee: f64,
    pub estimated_at: Option<DateTime<Utc>>,
}

/// Metadata revision. Status is never part of an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub estimated_at: Option<DateTime<Utc>>,
}

impl Delivery {
    /// Creates a delivery in status `assigned`.
    pub fn new(id: DeliveryId, params: DeliveryCreate, now: DateTime<Utc>) -> Self {
        Self {
            id,
            order_id: params.order_id,
            agent_id: params.agent_id,
            status: DeliveryStatus::Assigned,
            address: params.address,
            fee: params.fee,
            estimated_at: params.estimated_at,
            delivered_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves to `next` and returns the event describing the move.
    ///
    /// The caller has already checked legality; this only applies the change.
    pub(crate) fn advance(&mut self, next: DeliveryStatus, at: DateTime<Utc>) -> StatusEvent {
        let previous = self.status;
        self.status = next;
        self.version += 1;
        self.updated_at = at;
        if next == DeliveryStatus::Delivered {
            self.delivered_at = Some(at);
        }
        StatusEvent {
            delivery_id: self.id.clone(),
            previous_status: previous,
            new_status: next,
            version: self.version,
            timestamp: at,
        }
    }
}
