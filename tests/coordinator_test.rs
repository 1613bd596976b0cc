use actor_framework::mock::MockClient;
use actor_framework::{ActorEntity, FrameworkError};
use chrono::{Duration, Utc};
use delivery_tracking::clients::{DeliveryCoordinator, StoreClient};
use delivery_tracking::config::DeliveryConfig;
use delivery_tracking::delivery_actor::{DeliveryError, DeliveryRecord, ErrorKind};
use delivery_tracking::lifecycle::DeliverySystem;
use delivery_tracking::model::{
    ActorId, DeliveryCreate, DeliveryId, DeliveryStatus, TransitionRequest,
};
use delivery_tracking::tracking_actor;
use std::sync::Arc;

fn config() -> DeliveryConfig {
    DeliveryConfig {
        store_shards: 2,
        hub_shards: 2,
        operators: vec![ActorId::new("ops_1")],
        ..DeliveryConfig::default()
    }
}

fn assignment(agent: &str) -> DeliveryCreate {
    DeliveryCreate {
        order_id: "order_1".into(),
        agent_id: agent.into(),
        address: "12 Grant St".to_string(),
        fee: 4.5,
        estimated_at: None,
    }
}

async fn assigned(system: &DeliverySystem, id: &str) -> DeliveryId {
    let id = DeliveryId::new(id);
    system
        .coordinator
        .create_delivery(id.clone(), assignment("agent_1"))
        .await
        .unwrap();
    id
}

fn step(id: &DeliveryId, to: DeliveryStatus, actor: &str) -> TransitionRequest {
    TransitionRequest::new(id.clone(), to, actor)
}

#[tokio::test]
async fn test_lifecycle_follows_state_machine() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;

    let picked = coordinator
        .request_transition(step(&id, DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap();
    assert_eq!(picked.status, DeliveryStatus::PickedUp);
    assert_eq!(picked.version, 1);

    // Skipping a stage
    let err = coordinator
        .request_transition(step(&id, DeliveryStatus::Delivered, "agent_1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DeliveryError::InvalidTransition {
            id: id.clone(),
            from: DeliveryStatus::PickedUp,
            to: DeliveryStatus::Delivered,
        }
    );

    coordinator
        .request_transition(step(&id, DeliveryStatus::Delivering, "agent_1"))
        .await
        .unwrap();
    let done = coordinator
        .request_transition(step(&id, DeliveryStatus::Delivered, "agent_1"))
        .await
        .unwrap();
    assert_eq!(done.version, 3);
    assert!(done.delivered_at.is_some());

    // Nothing leaves a terminal state, not even an operator cancel
    for (to, actor) in [
        (DeliveryStatus::PickedUp, "agent_1"),
        (DeliveryStatus::Cancelled, "agent_1"),
        (DeliveryStatus::Cancelled, "ops_1"),
    ] {
        let err = coordinator
            .request_transition(step(&id, to, actor))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition, "{to} by {actor}");
    }

    let trail = coordinator.history(&id).await.unwrap();
    let statuses: Vec<DeliveryStatus> = trail.iter().map(|e| e.new_status).collect();
    assert_eq!(
        statuses,
        vec![
            DeliveryStatus::PickedUp,
            DeliveryStatus::Delivering,
            DeliveryStatus::Delivered
        ]
    );
    assert!(trail.iter().zip(1..).all(|(e, v)| e.version == v));

    drop(coordinator);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_transitions_one_wins() {
    let system = DeliverySystem::new(config());
    let id = assigned(&system, "d1").await;
    let mut feed = system.coordinator.events();

    let a = system.coordinator.clone();
    let b = system.coordinator.clone();
    let first = step(&id, DeliveryStatus::PickedUp, "agent_1").expecting(DeliveryStatus::Assigned);
    let second = step(&id, DeliveryStatus::Cancelled, "agent_1").expecting(DeliveryStatus::Assigned);
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { a.request_transition(first).await }),
        tokio::spawn(async move { b.request_transition(second).await }),
    );
    let results = [ra.unwrap(), rb.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "{results:?}");
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, DeliveryError::Conflict { .. }));
    assert!(loser.is_retryable());

    // Exactly one event for the one committed transition
    let event = feed.recv().await.unwrap();
    assert_eq!(event.version, 1);
    assert!(feed.try_recv().is_err());
    assert_eq!(system.coordinator.history(&id).await.unwrap().len(), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_expectation_is_conflict() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;

    coordinator
        .request_transition(step(&id, DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap();

    let err = coordinator
        .request_transition(
            step(&id, DeliveryStatus::PickedUp, "agent_1").expecting(DeliveryStatus::Assigned),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DeliveryError::Conflict {
            id: id.clone(),
            expected: DeliveryStatus::Assigned,
            actual: DeliveryStatus::PickedUp,
        }
    );
    assert_eq!(coordinator.get_delivery(&id).await.unwrap().version, 1);

    drop(coordinator);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_only_agent_moves_forward_and_operator_cancels() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;

    for actor in ["agent_2", "ops_1"] {
        let err = coordinator
            .request_transition(step(&id, DeliveryStatus::PickedUp, actor))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DeliveryError::Forbidden {
                id: id.clone(),
                actor: ActorId::new(actor),
            }
        );
    }

    let err = coordinator
        .request_transition(step(&id, DeliveryStatus::Cancelled, "agent_2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let cancelled = coordinator
        .request_transition(step(&id, DeliveryStatus::Cancelled, "ops_1"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, DeliveryStatus::Cancelled);
    assert!(cancelled.delivered_at.is_none());

    // The agent may cancel its own delivery
    let own = assigned(&system, "d2").await;
    coordinator
        .request_transition(step(&own, DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap();
    coordinator
        .request_transition(step(&own, DeliveryStatus::Cancelled, "agent_1"))
        .await
        .unwrap();

    drop(coordinator);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_create_validation_and_duplicates() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;

    let err = coordinator
        .create_delivery(id.clone(), assignment("agent_9"))
        .await
        .unwrap_err();
    assert_eq!(err, DeliveryError::AlreadyExists(id.clone()));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(!err.is_retryable());
    // The original assignment is untouched
    assert_eq!(
        coordinator.get_delivery(&id).await.unwrap().agent_id,
        ActorId::new("agent_1")
    );

    let mut blank = assignment("agent_1");
    blank.address = String::new();
    let mut negative = assignment("agent_1");
    negative.fee = -2.0;
    for params in [blank, negative] {
        let err = coordinator
            .create_delivery(DeliveryId::new("d2"), params)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
    assert_eq!(
        coordinator.get_delivery(&DeliveryId::new("d2")).await.unwrap_err(),
        DeliveryError::NotFound(DeliveryId::new("d2"))
    );

    let err = coordinator
        .request_transition(step(&DeliveryId::new("nope"), DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    drop(coordinator);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_revise_estimate() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;
    let eta = Utc::now() + Duration::minutes(25);

    let revised = coordinator
        .revise_estimate(&id, &ActorId::new("agent_1"), Some(eta))
        .await
        .unwrap();
    assert_eq!(revised.estimated_at, Some(eta));
    assert_eq!(revised.version, 0);

    let err = coordinator
        .revise_estimate(&id, &ActorId::new("ops_1"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    coordinator
        .request_transition(step(&id, DeliveryStatus::Cancelled, "agent_1"))
        .await
        .unwrap();
    let err = coordinator
        .revise_estimate(&id, &ActorId::new("agent_1"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    drop(coordinator);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_report_location_checks() {
    let system = DeliverySystem::new(config());
    let coordinator = system.coordinator.clone();
    let id = assigned(&system, "d1").await;
    let agent = ActorId::new("agent_1");

    for (lat, lon) in [(90.5, 0.0), (0.0, -180.1), (f64::NAN, 0.0)] {
        let err = coordinator
            .report_location(&id, &agent, lat, lon)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    let err = coordinator
        .report_location(&id, &ActorId::new("agent_2"), 1.0, 1.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let update = coordinator
        .report_location(&id, &agent, 52.52, 13.405)
        .await
        .unwrap();
    assert_eq!(update.delivery_id, id);
    assert_eq!(update.agent_id, agent);

    coordinator
        .request_transition(step(&id, DeliveryStatus::Cancelled, "ops_1"))
        .await
        .unwrap();
    let err = coordinator
        .report_location(&id, &agent, 52.52, 13.405)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    drop(coordinator);
    system.shutdown().await.unwrap();
}

/// Store failures reach the caller as `Unavailable`, and nothing is announced.
#[tokio::test]
async fn test_store_failures_are_unavailable() {
    let id = DeliveryId::new("d1");
    let record = DeliveryRecord::from_create_params(id.clone(), assignment("agent_1")).unwrap();

    let mut store_mock = MockClient::<DeliveryRecord>::new();
    store_mock
        .expect_get(id.clone())
        .return_err(FrameworkError::ActorClosed);
    store_mock.expect_get(id.clone()).return_ok(Some(record));
    store_mock
        .expect_action(id.clone())
        .return_err(FrameworkError::ActorDropped);

    // The hub is never started: no transition gets far enough to publish
    let (_hub_shards, hub) = tracking_actor::new(1, 8, 8);
    let store = StoreClient::from_clients(vec![store_mock.client()]);
    let coordinator = DeliveryCoordinator::new(Arc::new(store), hub, Vec::new(), 16);
    let mut feed = coordinator.events();

    let err = coordinator
        .request_transition(step(&id, DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Unavailable(_)));
    assert!(err.is_retryable());

    let err = coordinator
        .request_transition(step(&id, DeliveryStatus::PickedUp, "agent_1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    assert!(feed.try_recv().is_err());
    store_mock.verify();
}
