//! Entity trait implementation for delivery records.
//!
//! A [`DeliveryRecord`] is what the store actor keeps per delivery: the current
//! [`Delivery`] plus the audit trail of every [`StatusEvent`] it went through.

use super::actions::{DeliveryAction, DeliveryActionResult, Transition};
use super::DeliveryError;
use crate::model::{Delivery, DeliveryCreate, DeliveryId, DeliveryUpdate, StatusEvent};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;

#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub delivery: Delivery,
    pub trail: Vec<StatusEvent>,
}

impl DeliveryRecord {
    /// Validates an assignment payload.
    pub fn validate(params: &DeliveryCreate) -> Result<(), DeliveryError> {
        if params.address.trim().is_empty() {
            return Err(DeliveryError::Invalid("address must not be empty".into()));
        }
        if !params.fee.is_finite() || params.fee < 0.0 {
            return Err(DeliveryError::Invalid(format!(
                "fee must be a non-negative amount, got {}",
                params.fee
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ActorEntity for DeliveryRecord {
    type Id = DeliveryId;
    type Create = DeliveryCreate;
    type Update = DeliveryUpdate;
    type Action = DeliveryAction;
    type ActionResult = DeliveryActionResult;
    type Context = ();
    type Error = DeliveryError;

    /// Creates a new delivery in status `assigned` with an empty trail.
    fn from_create_params(id: DeliveryId, params: DeliveryCreate) -> Result<Self, Self::Error> {
        Self::validate(&params)?;
        Ok(Self {
            delivery: Delivery::new(id, params, Utc::now()),
            trail: Vec::new(),
        })
    }

    /// Revises metadata of an active delivery. Terminal deliveries are frozen.
    async fn on_update(
        &mut self,
        update: DeliveryUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        if self.delivery.is_terminal() {
            return Err(DeliveryError::Invalid(format!(
                "delivery {} is {} and can no longer change",
                self.delivery.id, self.delivery.status
            )));
        }
        self.delivery.estimated_at = update.estimated_at;
        self.delivery.updated_at = Utc::now();
        Ok(())
    }

    /// Handles custom actions for the delivery.
    ///
    /// # Actions
    /// - `Advance`: compare-and-swap on status. Fails with `Conflict` when the record has
    ///   moved away from `expected`, and with `InvalidTransition` when `next` is not a legal
    ///   successor. On success the event is appended to the trail before it is returned.
    /// - `History`: returns a copy of the trail.
    async fn handle_action(
        &mut self,
        action: DeliveryAction,
        _ctx: &Self::Context,
    ) -> Result<DeliveryActionResult, Self::Error> {
        match action {
            DeliveryAction::Advance { expected, next, at } => {
                let current = self.delivery.status;
                if current != expected {
                    return Err(DeliveryError::Conflict {
                        id: self.delivery.id.clone(),
                        expected,
                        actual: current,
                    });
                }
                if !current.can_transition_to(next) {
                    return Err(DeliveryError::InvalidTransition {
                        id: self.delivery.id.clone(),
                        from: current,
                        to: next,
                    });
                }
                let event = self.delivery.advance(next, at);
                self.trail.push(event.clone());
                Ok(DeliveryActionResult::Advanced(Transition {
                    delivery: self.delivery.clone(),
                    event,
                }))
            }
            DeliveryAction::History => Ok(DeliveryActionResult::History(self.trail.clone())),
        }
    }
}
