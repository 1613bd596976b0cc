//! # Hub Shard
//!
//! One shard of the subscriber registry. Like a `ResourceActor`, it owns its state and
//! handles one mailbox message at a time, so subscribe, unsubscribe and publish for a
//! delivery never interleave.
//!
//! Per delivery the shard keeps a [`Channel`]: the viewers, the version of the last event
//! fanned out (the cursor), and events waiting for a predecessor.

use super::message::{HubRequest, HubStats, Registration};
use super::TrackingError;
use crate::clients::DeliveryStateStore;
use crate::model::{DeliveryId, LocationUpdate, StatusEvent, TrackingEvent, ViewerId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

struct Viewer {
    session: u64,
    tx: mpsc::Sender<TrackingEvent>,
    /// Highest version this viewer already knows, from its snapshot or its stream.
    seen: u64,
}

struct Channel {
    cursor: u64,
    pending: BTreeMap<u64, StatusEvent>,
    viewers: HashMap<ViewerId, Viewer>,
}

impl Channel {
    fn new(cursor: u64) -> Self {
        Self {
            cursor,
            pending: BTreeMap::new(),
            viewers: HashMap::new(),
        }
    }

    /// Queues `event` and returns every event that is now next in version order.
    fn accept(&mut self, event: StatusEvent) -> Vec<StatusEvent> {
        self.pending.insert(event.version, event);
        self.drain()
    }

    /// Fills a gap from the delivery's audit trail, which holds every committed event.
    fn fill(&mut self, trail: Vec<StatusEvent>) -> Vec<StatusEvent> {
        for event in trail.into_iter().filter(|e| e.version > self.cursor) {
            self.pending.entry(event.version).or_insert(event);
        }
        self.drain()
    }

    /// Moves the cursor up to the oldest held event, giving up on whatever came before it.
    fn skip_gap(&mut self, delivery_id: &DeliveryId) -> Vec<StatusEvent> {
        if let Some(&first) = self.pending.keys().next() {
            warn!(%delivery_id, cursor = self.cursor, next = first, "Skipping events that never arrived");
            self.cursor = first - 1;
        }
        self.drain()
    }

    fn drain(&mut self) -> Vec<StatusEvent> {
        let mut ready = Vec::new();
        while let Some(next) = self.pending.remove(&(self.cursor + 1)) {
            self.cursor = next.version;
            ready.push(next);
        }
        ready
    }

    /// Offers `event` to every viewer without waiting. Viewers that are full or gone are
    /// removed.
    fn fan_out(&mut self, delivery_id: &DeliveryId, event: TrackingEvent, version: Option<u64>) {
        self.viewers.retain(|viewer_id, viewer| {
            if let Some(version) = version {
                if version <= viewer.seen {
                    return true;
                }
            }
            match viewer.tx.try_send(event.clone()) {
                Ok(()) => {
                    if let Some(version) = version {
                        viewer.seen = version;
                    }
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(%delivery_id, viewer = %viewer_id, "Viewer too slow, disconnecting");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%delivery_id, viewer = %viewer_id, "Viewer gone");
                    false
                }
            }
        });
    }
}

/// An actor owning a disjoint part of the subscriber registry.
pub struct TrackingShard {
    receiver: mpsc::Receiver<HubRequest>,
    channels: HashMap<DeliveryId, Channel>,
    viewer_buffer: usize,
    next_session: u64,
}

impl TrackingShard {
    /// Creates a shard and the sender feeding its mailbox.
    ///
    /// `viewer_buffer` bounds every viewer's outbound queue.
    pub fn new(mailbox_size: usize, viewer_buffer: usize) -> (Self, mpsc::Sender<HubRequest>) {
        let (sender, receiver) = mpsc::channel(mailbox_size.max(1));
        let shard = Self {
            receiver,
            channels: HashMap::new(),
            viewer_buffer: viewer_buffer.max(1),
            next_session: 0,
        };
        (shard, sender)
    }

    /// Runs the shard until every strong sender is dropped.
    ///
    /// Snapshots are read from `store` inside the loop, so a snapshot and the registration
    /// it starts are a single step with respect to publishes on this shard.
    pub async fn run(mut self, store: Arc<dyn DeliveryStateStore>) {
        info!("Tracking shard started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                HubRequest::Subscribe {
                    delivery_id,
                    viewer,
                    respond_to,
                } => {
                    let result = self.subscribe(store.as_ref(), delivery_id, viewer).await;
                    let _ = respond_to.send(result);
                }
                HubRequest::Unsubscribe {
                    delivery_id,
                    viewer,
                    respond_to,
                } => {
                    let removed = self.remove(&delivery_id, &viewer, None);
                    debug!(%delivery_id, %viewer, removed, "Unsubscribe");
                    let _ = respond_to.send(removed);
                }
                HubRequest::Release {
                    delivery_id,
                    viewer,
                    session,
                } => {
                    let removed = self.remove(&delivery_id, &viewer, Some(session));
                    debug!(%delivery_id, %viewer, session, removed, "Release");
                }
                HubRequest::Publish(event) => self.publish(store.as_ref(), event).await,
                HubRequest::Location(update) => self.locate(update),
                HubRequest::Stats { respond_to } => {
                    let _ = respond_to.send(self.stats());
                }
            }
        }

        info!(
            deliveries = self.channels.len(),
            "Tracking shard shutting down"
        );
    }

    async fn subscribe(
        &mut self,
        store: &dyn DeliveryStateStore,
        delivery_id: DeliveryId,
        viewer: ViewerId,
    ) -> Result<Registration, TrackingError> {
        let snapshot = store.get(&delivery_id).await?;
        let (tx, events) = mpsc::channel(self.viewer_buffer);
        self.next_session += 1;
        let session = self.next_session;

        if snapshot.is_terminal() {
            // The sender drops here, so the stream is already finished.
            debug!(%delivery_id, %viewer, status = %snapshot.status, "Subscribe to finished delivery");
            return Ok(Registration {
                snapshot,
                session,
                events,
            });
        }

        let channel = self
            .channels
            .entry(delivery_id.clone())
            .or_insert_with(|| Channel::new(snapshot.version));
        let replaced = channel
            .viewers
            .insert(
                viewer.clone(),
                Viewer {
                    session,
                    tx,
                    seen: snapshot.version,
                },
            )
            .is_some();
        info!(
            %delivery_id,
            %viewer,
            version = snapshot.version,
            replaced,
            viewers = channel.viewers.len(),
            "Subscribed"
        );

        Ok(Registration {
            snapshot,
            session,
            events,
        })
    }

    fn remove(&mut self, delivery_id: &DeliveryId, viewer: &ViewerId, session: Option<u64>) -> bool {
        let Some(channel) = self.channels.get_mut(delivery_id) else {
            return false;
        };
        let owned = match channel.viewers.get(viewer) {
            Some(current) => session.map_or(true, |s| s == current.session),
            None => false,
        };
        if owned {
            channel.viewers.remove(viewer);
        }
        if channel.viewers.is_empty() {
            self.channels.remove(delivery_id);
        }
        owned
    }

    /// Fans out `event` and whatever it unblocks, in version order.
    ///
    /// An event ahead of the cursor means an earlier one was committed but has not reached
    /// this shard, possibly never will. The missing events are read from the store's audit
    /// trail, like a snapshot. If the trail cannot be read, the gap is skipped.
    async fn publish(&mut self, store: &dyn DeliveryStateStore, event: StatusEvent) {
        let delivery_id = event.delivery_id.clone();
        let Some(channel) = self.channels.get_mut(&delivery_id) else {
            debug!(%delivery_id, version = event.version, "No viewers");
            return;
        };
        if event.version <= channel.cursor {
            debug!(%delivery_id, version = event.version, cursor = channel.cursor, "Stale event dropped");
            return;
        }

        let mut ready = channel.accept(event);
        if !channel.pending.is_empty() {
            debug!(%delivery_id, cursor = channel.cursor, held = channel.pending.len(), "Gap before event, reading trail");
            match store.history(&delivery_id).await {
                Ok(trail) => ready.extend(channel.fill(trail)),
                Err(e) => {
                    warn!(%delivery_id, error = %e, "Trail unavailable");
                    ready.extend(channel.skip_gap(&delivery_id));
                }
            }
        }

        let mut finished = false;
        for next in ready {
            let version = next.version;
            finished = next.new_status.is_terminal();
            channel.fan_out(&delivery_id, TrackingEvent::Status(next), Some(version));
            debug!(%delivery_id, version, viewers = channel.viewers.len(), "Fanned out");
            if finished {
                break;
            }
        }

        if finished {
            info!(%delivery_id, viewers = channel.viewers.len(), "Delivery finished, closing streams");
            self.channels.remove(&delivery_id);
        } else if channel.viewers.is_empty() {
            self.channels.remove(&delivery_id);
        }
    }

    fn locate(&mut self, update: LocationUpdate) {
        let delivery_id = update.delivery_id.clone();
        let Some(channel) = self.channels.get_mut(&delivery_id) else {
            return;
        };
        channel.fan_out(&delivery_id, TrackingEvent::Location(update), None);
        if channel.viewers.is_empty() {
            self.channels.remove(&delivery_id);
        }
    }

    fn stats(&self) -> HubStats {
        HubStats {
            deliveries: self.channels.len(),
            viewers: self.channels.values().map(|c| c.viewers.len()).sum(),
        }
    }
}
