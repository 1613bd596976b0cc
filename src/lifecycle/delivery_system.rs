use crate::clients::{DeliveryCoordinator, DeliveryStateStore, TrackingHub};
use crate::config::DeliveryConfig;
use crate::{delivery_actor, tracking_actor};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running delivery tracking service.
///
/// `DeliverySystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping every store shard and hub shard
/// - **Dependency Wiring**: Hub shards read snapshots from the store; the coordinator
///   writes to the store and publishes to the hub
///
/// The store itself is not exposed. Reads go through the coordinator, and so does every
/// status change.
///
/// # Example
///
/// ```ignore
/// let system = DeliverySystem::new(DeliveryConfig::load()?);
///
/// system.coordinator.create_delivery(id.clone(), assignment).await?;
/// let (snapshot, mut viewer) = system.hub.subscribe(id.clone(), "viewer_1".into()).await?;
/// system.coordinator.request_transition(TransitionRequest::new(id, DeliveryStatus::PickedUp, "agent_1")).await?;
///
/// system.shutdown().await?;
/// ```
pub struct DeliverySystem {
    pub coordinator: DeliveryCoordinator,
    pub hub: TrackingHub,
    handles: Vec<JoinHandle<()>>,
}

impl DeliverySystem {
    /// Spawns all shards and wires the coordinator. Must be called inside a Tokio runtime.
    pub fn new(config: DeliveryConfig) -> Self {
        // 1. Create actors (no dependencies)
        let (store_shards, store) = delivery_actor::new(config.store_shards, config.mailbox_size);
        let (hub_shards, hub) = tracking_actor::new(
            config.hub_shards,
            config.mailbox_size,
            config.viewer_buffer,
        );

        // 2. Start actors with injected context
        let mut handles = Vec::with_capacity(store_shards.len() + hub_shards.len());
        for shard in store_shards {
            handles.push(tokio::spawn(shard.run(())));
        }
        let snapshots: Arc<dyn DeliveryStateStore> = Arc::new(store);
        for shard in hub_shards {
            handles.push(tokio::spawn(shard.run(snapshots.clone())));
        }

        let coordinator = DeliveryCoordinator::new(
            snapshots,
            hub.clone(),
            config.operators,
            config.event_feed_capacity,
        );

        info!(
            store_shards = config.store_shards,
            hub_shards = config.hub_shards,
            "Delivery system started"
        );
        Self {
            coordinator,
            hub,
            handles,
        }
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Dropping the clients closes the hub mailboxes; each hub shard then exits and drops
    /// its store handle, which closes the store mailboxes. Open [`Subscription`]s only hold
    /// weak handles and do not delay this.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if all shards shut down cleanly
    /// - `Err(String)` if any shard task failed or panicked
    ///
    /// [`Subscription`]: crate::clients::Subscription
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        drop(self.coordinator);
        drop(self.hub);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
