//! # Store Client
//!
//! Provides the [`DeliveryStateStore`] API over the sharded `DeliveryRecord` actors.
//! It wraps a `ShardedClient<DeliveryRecord>` and maps framework failures into
//! [`DeliveryError`]s.
use crate::delivery_actor::{
    DeliveryAction, DeliveryActionResult, DeliveryError, DeliveryRecord, Transition,
};
use crate::model::{Delivery, DeliveryCreate, DeliveryId, DeliveryStatus, DeliveryUpdate, StatusEvent};
use actor_framework::{ResourceClient, ShardedClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Durable record of every delivery's lifecycle state.
///
/// The coordinator and the tracking hub only see this trait, so either can be driven by
/// a test double.
#[async_trait]
pub trait DeliveryStateStore: Send + Sync {
    async fn get(&self, id: &DeliveryId) -> Result<Delivery, DeliveryError>;

    /// Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, id: DeliveryId, params: DeliveryCreate)
        -> Result<Delivery, DeliveryError>;

    /// Compare-and-swap on status.
    ///
    /// Commits `next` only if the record is still in `expected`, otherwise fails with
    /// `Conflict`. Fails with `InvalidTransition` if `next` is not reachable.
    async fn update_status(
        &self,
        id: &DeliveryId,
        expected: DeliveryStatus,
        next: DeliveryStatus,
        at: DateTime<Utc>,
    ) -> Result<Transition, DeliveryError>;

    async fn revise_estimate(
        &self,
        id: &DeliveryId,
        estimated_at: Option<DateTime<Utc>>,
    ) -> Result<Delivery, DeliveryError>;

    /// The audit trail, oldest first.
    async fn history(&self, id: &DeliveryId) -> Result<Vec<StatusEvent>, DeliveryError>;
}

/// Client for the sharded Delivery actors.
#[derive(Clone)]
pub struct StoreClient {
    inner: ShardedClient<DeliveryRecord>,
}

impl StoreClient {
    pub fn new(inner: ShardedClient<DeliveryRecord>) -> Self {
        Self { inner }
    }

    /// Builds a client over already-running shard clients (or mocks of them).
    ///
    /// # Panics
    /// Panics if `clients` is empty.
    pub fn from_clients(clients: Vec<ResourceClient<DeliveryRecord>>) -> Self {
        Self::new(ShardedClient::new(clients))
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shard_count()
    }
}

#[async_trait]
impl DeliveryStateStore for StoreClient {
    #[instrument(skip(self, id), fields(delivery_id = %id))]
    async fn get(&self, id: &DeliveryId) -> Result<Delivery, DeliveryError> {
        debug!("Sending request");
        match self.inner.get(id.clone()).await {
            Ok(Some(record)) => Ok(record.delivery),
            Ok(None) => Err(DeliveryError::NotFound(id.clone())),
            Err(e) => Err(DeliveryError::from_framework(id, e)),
        }
    }

    #[instrument(skip(self, id, params), fields(delivery_id = %id))]
    async fn create(
        &self,
        id: DeliveryId,
        params: DeliveryCreate,
    ) -> Result<Delivery, DeliveryError> {
        debug!(?params, "create called");
        self.inner
            .create(id.clone(), params)
            .await
            .map(|record| record.delivery)
            .map_err(|e| DeliveryError::from_framework(&id, e))
    }

    #[instrument(skip(self, id, at), fields(delivery_id = %id))]
    async fn update_status(
        &self,
        id: &DeliveryId,
        expected: DeliveryStatus,
        next: DeliveryStatus,
        at: DateTime<Utc>,
    ) -> Result<Transition, DeliveryError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id.clone(), DeliveryAction::Advance { expected, next, at })
            .await
        {
            Ok(DeliveryActionResult::Advanced(transition)) => Ok(transition),
            Ok(_) => unreachable!("Advance action must return Advanced result"),
            Err(e) => Err(DeliveryError::from_framework(id, e)),
        }
    }

    #[instrument(skip(self, id), fields(delivery_id = %id))]
    async fn revise_estimate(
        &self,
        id: &DeliveryId,
        estimated_at: Option<DateTime<Utc>>,
    ) -> Result<Delivery, DeliveryError> {
        debug!("Sending request");
        self.inner
            .update(id.clone(), DeliveryUpdate { estimated_at })
            .await
            .map(|record| record.delivery)
            .map_err(|e| DeliveryError::from_framework(id, e))
    }

    #[instrument(skip(self, id), fields(delivery_id = %id))]
    async fn history(&self, id: &DeliveryId) -> Result<Vec<StatusEvent>, DeliveryError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id.clone(), DeliveryAction::History)
            .await
        {
            Ok(DeliveryActionResult::History(trail)) => Ok(trail),
            Ok(_) => unreachable!("History action must return History result"),
            Err(e) => Err(DeliveryError::from_framework(id, e)),
        }
    }
}
