//! # Delivery Coordinator
//!
//! The only writer of delivery status. Every transition goes through
//! [`DeliveryCoordinator::request_transition`]:
//!
//! 1. load the delivery,
//! 2. check the move against the state machine (`InvalidTransition`),
//! 3. check who is asking (`Forbidden`),
//! 4. commit with a compare-and-swap on the status the check used (`Conflict`),
//! 5. hand the resulting event to the event feed and, on a separate task, the tracking hub.
//!
//! The coordinator never retries. Retrying a `Conflict` or `Unavailable` is up to the
//! caller.
use crate::clients::{DeliveryStateStore, TrackingHub};
use crate::delivery_actor::{DeliveryError, DeliveryRecord};
use crate::model::{
    ActorId, Delivery, DeliveryCreate, DeliveryId, DeliveryStatus, LocationUpdate, StatusEvent,
    TransitionRequest,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn, Instrument};

#[derive(Clone)]
pub struct DeliveryCoordinator {
    store: Arc<dyn DeliveryStateStore>,
    hub: TrackingHub,
    operators: Arc<HashSet<ActorId>>,
    feed: broadcast::Sender<StatusEvent>,
}

impl DeliveryCoordinator {
    /// `operators` may cancel any delivery. `feed_capacity` bounds how far an
    /// [`events`](Self::events) subscriber may lag before it skips events.
    pub fn new(
        store: Arc<dyn DeliveryStateStore>,
        hub: TrackingHub,
        operators: impl IntoIterator<Item = ActorId>,
        feed_capacity: usize,
    ) -> Self {
        let (feed, _) = broadcast::channel(feed_capacity.max(1));
        Self {
            store,
            hub,
            operators: Arc::new(operators.into_iter().collect()),
            feed,
        }
    }

    pub fn hub(&self) -> &TrackingHub {
        &self.hub
    }

    pub fn is_operator(&self, actor: &ActorId) -> bool {
        self.operators.contains(actor)
    }

    /// Every committed status event, process-wide.
    ///
    /// A receiver that falls behind gets `RecvError::Lagged` and continues with newer
    /// events. It never holds up a transition.
    pub fn events(&self) -> broadcast::Receiver<StatusEvent> {
        self.feed.subscribe()
    }

    /// Registers a freshly assigned delivery in status `assigned`.
    #[instrument(skip(self, params))]
    pub async fn create_delivery(
        &self,
        id: DeliveryId,
        params: DeliveryCreate,
    ) -> Result<Delivery, DeliveryError> {
        debug!(?params, "create_delivery called");
        DeliveryRecord::validate(&params)?;
        let delivery = self.store.create(id, params).await?;
        info!(agent_id = %delivery.agent_id, "Delivery assigned");
        Ok(delivery)
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(&self, id: &DeliveryId) -> Result<Delivery, DeliveryError> {
        self.store.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn history(&self, id: &DeliveryId) -> Result<Vec<StatusEvent>, DeliveryError> {
        self.store.history(id).await
    }

    /// Validates, authorizes and commits one status change.
    ///
    /// When the request pins `expected_status`, the check and the compare-and-swap use it
    /// instead of the freshly loaded status, so a stale view surfaces as `Conflict`.
    #[instrument(
        skip(self, request),
        fields(
            delivery_id = %request.delivery_id,
            to = %request.requested_status,
            actor = %request.actor_id
        )
    )]
    pub async fn request_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<Delivery, DeliveryError> {
        debug!(?request, "request_transition called");
        let current = self.store.get(&request.delivery_id).await?;
        let expected = request.expected_status.unwrap_or(current.status);
        let next = request.requested_status;

        if !expected.can_transition_to(next) {
            warn!(from = %expected, "Illegal transition");
            return Err(DeliveryError::InvalidTransition {
                id: request.delivery_id,
                from: expected,
                to: next,
            });
        }
        self.authorize(&current, &request.actor_id, next)?;

        let committed = self
            .store
            .update_status(&request.delivery_id, expected, next, Utc::now())
            .await?;
        info!(version = committed.event.version, from = %expected, "Transition committed");

        self.announce(committed.event);
        Ok(committed.delivery)
    }

    /// Updates the estimated arrival. Only the assigned agent may do this.
    #[instrument(skip(self))]
    pub async fn revise_estimate(
        &self,
        id: &DeliveryId,
        actor: &ActorId,
        estimated_at: Option<DateTime<Utc>>,
    ) -> Result<Delivery, DeliveryError> {
        let current = self.store.get(id).await?;
        if current.agent_id != *actor {
            return Err(DeliveryError::Forbidden {
                id: id.clone(),
                actor: actor.clone(),
            });
        }
        self.store.revise_estimate(id, estimated_at).await
    }

    /// Forwards a live position from the assigned agent to the delivery's viewers.
    #[instrument(skip(self))]
    pub async fn report_location(
        &self,
        id: &DeliveryId,
        actor: &ActorId,
        latitude: f64,
        longitude: f64,
    ) -> Result<LocationUpdate, DeliveryError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DeliveryError::Invalid(format!(
                "coordinates out of range: ({latitude}, {longitude})"
            )));
        }

        let current = self.store.get(id).await?;
        if current.agent_id != *actor {
            return Err(DeliveryError::Forbidden {
                id: id.clone(),
                actor: actor.clone(),
            });
        }
        if current.is_terminal() {
            return Err(DeliveryError::Invalid(format!(
                "delivery {id} is {} and is no longer tracked",
                current.status
            )));
        }

        let update = LocationUpdate {
            delivery_id: id.clone(),
            agent_id: actor.clone(),
            latitude,
            longitude,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.hub.publish_location(update.clone()).await {
            warn!(error = %e, "Location not forwarded");
        }
        Ok(update)
    }

    /// Forward moves belong to the assigned agent. Cancellation is also open to operators.
    fn authorize(
        &self,
        delivery: &Delivery,
        actor: &ActorId,
        next: DeliveryStatus,
    ) -> Result<(), DeliveryError> {
        let allowed = delivery.agent_id == *actor
            || (next == DeliveryStatus::Cancelled && self.is_operator(actor));
        if allowed {
            Ok(())
        } else {
            warn!("Actor not allowed");
            Err(DeliveryError::Forbidden {
                id: delivery.id.clone(),
                actor: actor.clone(),
            })
        }
    }

    /// Fans a committed event out. Failures here never undo the transition.
    ///
    /// The hub hand-off runs on its own task, so a caller that stops waiting once the
    /// commit is done cannot keep the event from viewers.
    fn announce(&self, event: StatusEvent) {
        if self.feed.send(event.clone()).is_err() {
            debug!("No event feed subscribers");
        }
        let hub = self.hub.clone();
        tokio::spawn(
            async move {
                if let Err(e) = hub.publish(event).await {
                    warn!(error = %e, "Tracking hub did not take the event");
                }
            }
            .in_current_span(),
        );
    }
}
