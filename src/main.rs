//! Walks one delivery through its lifecycle with two live viewers attached.

use delivery_tracking::clients::Subscription;
use delivery_tracking::config::DeliveryConfig;
use delivery_tracking::lifecycle::{setup_tracing, DeliverySystem};
use delivery_tracking::model::{DeliveryCreate, DeliveryId, DeliveryStatus, TransitionRequest};
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};

fn watch(mut subscription: Subscription) -> JoinHandle<usize> {
    let span = tracing::info_span!("viewer", viewer = %subscription.viewer());
    tokio::spawn(
        async move {
            let mut seen = 0;
            while let Some(event) = subscription.recv().await {
                seen += 1;
                match event.to_json() {
                    Ok(frame) => info!(%frame, "Event"),
                    Err(e) => error!(error = %e, "Event not encodable"),
                }
            }
            info!(seen, "Stream ended");
            seen
        }
        .instrument(span),
    )
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = DeliveryConfig::load().map_err(|e| e.to_string())?;
    info!(?config, "Starting delivery tracking");
    let system = DeliverySystem::new(config);
    let coordinator = system.coordinator.clone();

    let id = DeliveryId::new("delivery_1");
    let assignment = DeliveryCreate {
        order_id: "order_1".into(),
        agent_id: "agent_1".into(),
        address: "12 Grant St".to_string(),
        fee: 4.5,
        estimated_at: None,
    };
    coordinator
        .create_delivery(id.clone(), assignment)
        .await
        .map_err(|e| e.to_string())?;

    let (_, early) = system
        .hub
        .subscribe(id.clone(), "viewer_1".into())
        .await
        .map_err(|e| e.to_string())?;
    let early = watch(early);

    let span = tracing::info_span!("lifecycle", delivery_id = %id);
    let late = async {
        coordinator
            .request_transition(TransitionRequest::new(id.clone(), DeliveryStatus::PickedUp, "agent_1"))
            .await
            .map_err(|e| e.to_string())?;
        coordinator
            .report_location(&id, &"agent_1".into(), 52.52, 13.405)
            .await
            .map_err(|e| e.to_string())?;

        // Skipping a stage is refused
        if let Err(e) = coordinator
            .request_transition(TransitionRequest::new(id.clone(), DeliveryStatus::Delivered, "agent_1"))
            .await
        {
            info!(error = %e, kind = ?e.kind(), "Rejected as expected");
        }

        let (snapshot, late) = system
            .hub
            .subscribe(id.clone(), "viewer_2".into())
            .await
            .map_err(|e| e.to_string())?;
        info!(status = %snapshot.status, version = snapshot.version, "Late viewer joined");
        let late = watch(late);

        for next in [DeliveryStatus::Delivering, DeliveryStatus::Delivered] {
            coordinator
                .request_transition(TransitionRequest::new(id.clone(), next, "agent_1"))
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok::<_, String>(late)
    }
    .instrument(span)
    .await?;

    // Both streams end on the terminal event
    let early = early.await.map_err(|e| e.to_string())?;
    let late = late.await.map_err(|e| e.to_string())?;
    info!(early, late, "Viewers finished");

    let trail = coordinator.history(&id).await.map_err(|e| e.to_string())?;
    info!(transitions = trail.len(), "Audit trail");

    drop(coordinator);
    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
