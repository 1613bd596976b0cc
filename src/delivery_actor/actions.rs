//! Custom actions for the Delivery actor.
//!
//! These are handled by [`ActorEntity::handle_action`](actor_framework::ActorEntity::handle_action)
//! on [`DeliveryRecord`](super::DeliveryRecord), one at a time per shard.

use crate::model::{Delivery, DeliveryStatus, StatusEvent};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum DeliveryAction {
    /// Compare-and-swap on status: move from `expected` to `next` if and only if the
    /// record is still in `expected`.
    Advance {
        expected: DeliveryStatus,
        next: DeliveryStatus,
        at: DateTime<Utc>,
    },
    /// Read the audit trail.
    History,
}

/// Results from DeliveryActions - variants match 1:1 with DeliveryAction
#[derive(Debug, Clone)]
pub enum DeliveryActionResult {
    Advanced(Transition),
    History(Vec<StatusEvent>),
}

/// The committed state after a successful advance, and the event describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub delivery: Delivery,
    pub event: StatusEvent,
}
