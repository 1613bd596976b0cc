use chrono::Utc;
use delivery_tracking::clients::{
    DeliveryCoordinator, DeliveryStateStore, StoreClient, Subscription, TrackingHub,
};
use delivery_tracking::config::DeliveryConfig;
use delivery_tracking::delivery_actor::{self, DeliveryError};
use delivery_tracking::lifecycle::DeliverySystem;
use delivery_tracking::model::{
    ActorId, DeliveryCreate, DeliveryId, DeliveryStatus, StatusEvent, TrackingEvent,
    TransitionRequest, ViewerId,
};
use delivery_tracking::tracking_actor::{self, HubStats, TrackingError};
use std::sync::Arc;
use tokio::task::JoinHandle;

fn system_with_buffer(viewer_buffer: usize) -> DeliverySystem {
    DeliverySystem::new(DeliveryConfig {
        store_shards: 2,
        hub_shards: 3,
        viewer_buffer,
        operators: vec![ActorId::new("ops_1")],
        ..DeliveryConfig::default()
    })
}

/// Store, hub and coordinator wired by hand, keeping a store handle so a test can commit
/// an event that is never published.
struct Wired {
    store: StoreClient,
    hub: TrackingHub,
    coordinator: DeliveryCoordinator,
    handles: Vec<JoinHandle<()>>,
}

impl Wired {
    fn new() -> Self {
        let (store_shards, store) = delivery_actor::new(2, 32);
        let (hub_shards, hub) = tracking_actor::new(3, 32, 16);
        let mut handles = Vec::new();
        for shard in store_shards {
            handles.push(tokio::spawn(shard.run(())));
        }
        let snapshots: Arc<dyn DeliveryStateStore> = Arc::new(store.clone());
        for shard in hub_shards {
            handles.push(tokio::spawn(shard.run(snapshots.clone())));
        }
        let coordinator = DeliveryCoordinator::new(snapshots, hub.clone(), Vec::new(), 16);
        Self {
            store,
            hub,
            coordinator,
            handles,
        }
    }

    /// Commits through the store only.
    async fn commit(
        &self,
        id: &DeliveryId,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> StatusEvent {
        self.store
            .update_status(id, from, to, Utc::now())
            .await
            .unwrap()
            .event
    }

    async fn shutdown(self) {
        drop(self.coordinator);
        drop(self.hub);
        drop(self.store);
        for handle in self.handles {
            handle.await.unwrap();
        }
    }
}

async fn assigned(coordinator: &DeliveryCoordinator, id: &str) -> DeliveryId {
    let id = DeliveryId::new(id);
    let params = DeliveryCreate {
        order_id: "order_1".into(),
        agent_id: "agent_1".into(),
        address: "12 Grant St".to_string(),
        fee: 4.5,
        estimated_at: None,
    };
    coordinator.create_delivery(id.clone(), params).await.unwrap();
    id
}

async fn transition(coordinator: &DeliveryCoordinator, id: &DeliveryId, to: DeliveryStatus) {
    coordinator
        .request_transition(TransitionRequest::new(id.clone(), to, "agent_1"))
        .await
        .unwrap();
}

async fn subscribe(hub: &TrackingHub, id: &DeliveryId, viewer: &str) -> (u64, Subscription) {
    let (snapshot, subscription) = hub
        .subscribe(id.clone(), ViewerId::new(viewer))
        .await
        .unwrap();
    (snapshot.version, subscription)
}

/// Reads the stream to its end and returns the status versions seen.
async fn drain(subscription: &mut Subscription) -> Vec<u64> {
    let mut versions = Vec::new();
    while let Some(event) = subscription.recv().await {
        if let TrackingEvent::Status(event) = event {
            versions.push(event.version);
        }
    }
    versions
}

async fn next_version(subscription: &mut Subscription) -> u64 {
    subscription
        .recv()
        .await
        .and_then(|e| e.as_status().map(|s| s.version))
        .unwrap()
}

#[tokio::test]
async fn test_early_and_late_viewers_share_order() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;

    let (v1_version, mut v1) = subscribe(&system.hub, &id, "viewer_1").await;
    assert_eq!(v1_version, 0);

    transition(&system.coordinator, &id, DeliveryStatus::PickedUp).await;

    let (snapshot, mut v2) = system
        .hub
        .subscribe(id.clone(), ViewerId::new("viewer_2"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, DeliveryStatus::PickedUp);
    assert_eq!(snapshot.version, 1);

    transition(&system.coordinator, &id, DeliveryStatus::Delivering).await;
    transition(&system.coordinator, &id, DeliveryStatus::Delivered).await;

    // Both streams end after the terminal event
    assert_eq!(drain(&mut v1).await, vec![1, 2, 3]);
    assert_eq!(drain(&mut v2).await, vec![2, 3]);
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_snapshot_ahead_of_publish_is_not_replayed() {
    let system = Wired::new();
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut early) = subscribe(&system.hub, &id, "early").await;

    // Committed but not yet published when the late viewer joins
    let first = system.commit(&id, DeliveryStatus::Assigned, DeliveryStatus::PickedUp).await;
    let (late_version, mut late) = subscribe(&system.hub, &id, "late").await;
    assert_eq!(late_version, 1);
    system.hub.publish(first).await.unwrap();

    let second = system.commit(&id, DeliveryStatus::PickedUp, DeliveryStatus::Delivering).await;
    system.hub.publish(second).await.unwrap();

    assert_eq!(next_version(&mut early).await, 1);
    assert_eq!(next_version(&mut early).await, 2);
    assert_eq!(next_version(&mut late).await, 2);

    system.shutdown().await;
}

#[tokio::test]
async fn test_subscribe_after_n_transitions() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;

    transition(&system.coordinator, &id, DeliveryStatus::PickedUp).await;
    transition(&system.coordinator, &id, DeliveryStatus::Delivering).await;

    let (version, mut viewer) = subscribe(&system.hub, &id, "viewer_1").await;
    assert_eq!(version, 2);

    // A late duplicate of an event the snapshot covers is ignored
    let trail = system.coordinator.history(&id).await.unwrap();
    system.hub.publish(trail[1].clone()).await.unwrap();

    transition(&system.coordinator, &id, DeliveryStatus::Delivered).await;
    assert_eq!(drain(&mut viewer).await, vec![3]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_out_of_order_publish_is_reordered() {
    let system = Wired::new();
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut viewer) = subscribe(&system.hub, &id, "viewer_1").await;

    let first = system.commit(&id, DeliveryStatus::Assigned, DeliveryStatus::PickedUp).await;
    let second = system.commit(&id, DeliveryStatus::PickedUp, DeliveryStatus::Delivering).await;
    let third = system.commit(&id, DeliveryStatus::Delivering, DeliveryStatus::Delivered).await;

    // The early arrival pulls the events before it from the trail; the rest are stale
    system.hub.publish(second).await.unwrap();
    system.hub.publish(first.clone()).await.unwrap();
    system.hub.publish(first).await.unwrap();
    system.hub.publish(third).await.unwrap();

    assert_eq!(drain(&mut viewer).await, vec![1, 2, 3]);

    system.shutdown().await;
}

#[tokio::test]
async fn test_committed_event_that_is_never_published_does_not_stall_viewers() {
    let system = Wired::new();
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut viewer) = subscribe(&system.hub, &id, "viewer_1").await;

    // The publisher of version 1 went away right after its commit
    system.commit(&id, DeliveryStatus::Assigned, DeliveryStatus::PickedUp).await;

    transition(&system.coordinator, &id, DeliveryStatus::Delivering).await;
    transition(&system.coordinator, &id, DeliveryStatus::Delivered).await;

    assert_eq!(drain(&mut viewer).await, vec![1, 2, 3]);
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    system.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    let viewer = ViewerId::new("viewer_1");
    let (_, mut subscription) = subscribe(&system.hub, &id, "viewer_1").await;
    assert_eq!(
        system.hub.stats().await.unwrap(),
        HubStats {
            deliveries: 1,
            viewers: 1
        }
    );

    assert!(system.hub.unsubscribe(&id, &viewer).await.unwrap());
    assert!(!system.hub.unsubscribe(&id, &viewer).await.unwrap());
    assert!(!system
        .hub
        .unsubscribe(&DeliveryId::new("other"), &viewer)
        .await
        .unwrap());

    assert!(subscription.recv().await.is_none());
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    // Publishing after everyone left is harmless
    transition(&system.coordinator, &id, DeliveryStatus::PickedUp).await;
    drop(subscription);
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dropping_a_subscription_unsubscribes() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    let (_, first) = subscribe(&system.hub, &id, "viewer_1").await;
    let (_, second) = subscribe(&system.hub, &id, "viewer_2").await;

    drop(first);
    assert_eq!(system.hub.stats().await.unwrap().viewers, 1);

    second.unsubscribe().await;
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_resubscribe_replaces_old_stream() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut old) = subscribe(&system.hub, &id, "viewer_1").await;
    let (_, mut new) = subscribe(&system.hub, &id, "viewer_1").await;

    assert!(old.recv().await.is_none());
    // The old handle's release must not remove the new registration
    drop(old);
    assert_eq!(
        system.hub.stats().await.unwrap(),
        HubStats {
            deliveries: 1,
            viewers: 1
        }
    );

    transition(&system.coordinator, &id, DeliveryStatus::PickedUp).await;
    assert_eq!(next_version(&mut new).await, 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_slow_viewer_is_dropped_without_stalling_others() {
    let system = system_with_buffer(1);
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut slow) = subscribe(&system.hub, &id, "slow").await;
    let (_, mut fast) = subscribe(&system.hub, &id, "fast").await;

    transition(&system.coordinator, &id, DeliveryStatus::PickedUp).await;
    assert_eq!(next_version(&mut fast).await, 1);

    transition(&system.coordinator, &id, DeliveryStatus::Delivering).await;
    assert_eq!(next_version(&mut fast).await, 2);

    assert_eq!(
        system.hub.stats().await.unwrap(),
        HubStats {
            deliveries: 1,
            viewers: 1
        }
    );
    // The slow viewer keeps what it had buffered, then its stream ends
    assert_eq!(drain(&mut slow).await, vec![1]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_location_updates_reach_viewers() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut viewer) = subscribe(&system.hub, &id, "viewer_1").await;

    system
        .coordinator
        .report_location(&id, &ActorId::new("agent_1"), 52.52, 13.405)
        .await
        .unwrap();

    let event = viewer.recv().await.unwrap();
    match &event {
        TrackingEvent::Location(update) => {
            assert_eq!(update.latitude, 52.52);
            assert_eq!(update.longitude, 13.405);
        }
        other => panic!("expected a location, got {other:?}"),
    }
    let frame = event.to_json().unwrap();
    assert!(frame.contains(r#""type":"location""#), "{frame}");

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_finished_and_unknown_deliveries() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    transition(&system.coordinator, &id, DeliveryStatus::Cancelled).await;

    let (snapshot, mut subscription) = system
        .hub
        .subscribe(id.clone(), ViewerId::new("viewer_1"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, DeliveryStatus::Cancelled);
    assert!(subscription.recv().await.is_none());
    assert_eq!(system.hub.stats().await.unwrap(), HubStats::default());

    let err = system
        .hub
        .subscribe(DeliveryId::new("nope"), ViewerId::new("viewer_1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TrackingError::Delivery(DeliveryError::NotFound(DeliveryId::new("nope")))
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_open_subscriptions_do_not_block_shutdown() {
    let system = system_with_buffer(16);
    let id = assigned(&system.coordinator, "d1").await;
    let (_, mut subscription) = subscribe(&system.hub, &id, "viewer_1").await;

    system.shutdown().await.unwrap();

    assert!(subscription.recv().await.is_none());
    // Dropping after shutdown finds no hub to release from
    drop(subscription);
}
