//! # Tracking Client
//!
//! [`TrackingHub`] routes subscriber registry operations to the hub shards.
//! [`Subscription`] is what a live connection holds while it watches a delivery.
use crate::model::{Delivery, DeliveryId, LocationUpdate, StatusEvent, TrackingEvent, ViewerId};
use crate::tracking_actor::{HubRequest, HubStats, TrackingError};
use actor_framework::shard_for;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for the sharded tracking hub. Cheap to clone.
#[derive(Clone)]
pub struct TrackingHub {
    shards: Vec<mpsc::Sender<HubRequest>>,
}

impl TrackingHub {
    /// Wraps the mailboxes of running hub shards.
    ///
    /// # Panics
    /// Panics if `shards` is empty.
    pub fn new(shards: Vec<mpsc::Sender<HubRequest>>) -> Self {
        assert!(!shards.is_empty(), "TrackingHub needs at least one shard");
        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, delivery_id: &DeliveryId) -> &mpsc::Sender<HubRequest> {
        &self.shards[shard_for(delivery_id, self.shards.len())]
    }

    async fn send(&self, delivery_id: &DeliveryId, request: HubRequest) -> Result<(), TrackingError> {
        self.shard(delivery_id)
            .send(request)
            .await
            .map_err(|_| TrackingError::HubClosed)
    }

    /// Registers `viewer` on `delivery_id` and returns the current snapshot with the stream
    /// of everything that happens after it.
    ///
    /// Reusing a viewer handle replaces its earlier registration, whose stream then ends.
    /// A delivery that is already finished yields its snapshot and an ended stream.
    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        delivery_id: DeliveryId,
        viewer: ViewerId,
    ) -> Result<(Delivery, Subscription), TrackingError> {
        let (respond_to, response) = oneshot::channel();
        let shard = self.shard(&delivery_id);
        shard
            .send(HubRequest::Subscribe {
                delivery_id: delivery_id.clone(),
                viewer: viewer.clone(),
                respond_to,
            })
            .await
            .map_err(|_| TrackingError::HubClosed)?;
        let registration = response.await.map_err(|_| TrackingError::HubClosed)??;
        debug!(version = registration.snapshot.version, "Subscribed");

        let subscription = Subscription {
            delivery_id,
            viewer,
            session: registration.session,
            events: registration.events,
            hub: shard.downgrade(),
            released: false,
        };
        Ok((registration.snapshot, subscription))
    }

    /// Removes `viewer` from `delivery_id`. Returns whether it was registered.
    #[instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        delivery_id: &DeliveryId,
        viewer: &ViewerId,
    ) -> Result<bool, TrackingError> {
        let (respond_to, response) = oneshot::channel();
        self.send(
            delivery_id,
            HubRequest::Unsubscribe {
                delivery_id: delivery_id.clone(),
                viewer: viewer.clone(),
                respond_to,
            },
        )
        .await?;
        response.await.map_err(|_| TrackingError::HubClosed)
    }

    /// Hands a committed status event to the shard owning its delivery.
    #[instrument(skip(self, event), fields(delivery_id = %event.delivery_id, version = event.version))]
    pub async fn publish(&self, event: StatusEvent) -> Result<(), TrackingError> {
        let delivery_id = event.delivery_id.clone();
        self.send(&delivery_id, HubRequest::Publish(event)).await
    }

    #[instrument(skip(self, update), fields(delivery_id = %update.delivery_id))]
    pub async fn publish_location(&self, update: LocationUpdate) -> Result<(), TrackingError> {
        let delivery_id = update.delivery_id.clone();
        self.send(&delivery_id, HubRequest::Location(update)).await
    }

    /// Registry size summed over all shards.
    pub async fn stats(&self) -> Result<HubStats, TrackingError> {
        let mut total = HubStats::default();
        for shard in &self.shards {
            let (respond_to, response) = oneshot::channel();
            shard
                .send(HubRequest::Stats { respond_to })
                .await
                .map_err(|_| TrackingError::HubClosed)?;
            total = total + response.await.map_err(|_| TrackingError::HubClosed)?;
        }
        Ok(total)
    }
}

/// A viewer's live registration on one delivery.
///
/// Dropping it unsubscribes. It only holds a weak handle to its hub shard, so open
/// subscriptions never keep the hub running.
#[derive(Debug)]
pub struct Subscription {
    delivery_id: DeliveryId,
    viewer: ViewerId,
    session: u64,
    events: mpsc::Receiver<TrackingEvent>,
    hub: mpsc::WeakSender<HubRequest>,
    released: bool,
}

impl Subscription {
    pub fn delivery_id(&self) -> &DeliveryId {
        &self.delivery_id
    }

    pub fn viewer(&self) -> &ViewerId {
        &self.viewer
    }

    /// Waits for the next event. `None` once the stream has ended: the delivery finished,
    /// the viewer was disconnected or replaced, or the hub stopped.
    pub async fn recv(&mut self) -> Option<TrackingEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Result<TrackingEvent, TryRecvError> {
        self.events.try_recv()
    }

    /// Unsubscribes and waits until the shard has queued the removal.
    pub async fn unsubscribe(mut self) {
        self.released = true;
        if let Some(hub) = self.hub.upgrade() {
            let _ = hub.send(self.release_request()).await;
        }
    }

    fn release_request(&self) -> HubRequest {
        HubRequest::Release {
            delivery_id: self.delivery_id.clone(),
            viewer: self.viewer.clone(),
            session: self.session,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        if let Err(TrySendError::Full(request)) = hub.try_send(self.release_request()) {
            // Outside a runtime the registration goes away on the next failed fan-out.
            if let Ok(runtime) = Handle::try_current() {
                runtime.spawn(async move {
                    let _ = hub.send(request).await;
                });
            }
        }
    }
}
