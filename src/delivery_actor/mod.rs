//! # Delivery Actor
//!
//! The durable side of the system: every delivery record, its status and its audit trail.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`DeliveryRecord`]
//! - [`error`] - [`DeliveryError`] and its [`ErrorKind`] classification
//! - [`actions`] - [`DeliveryAction`] (compare-and-swap advance, history) and its results
//! - [`new()`] - Factory function that creates the shards and the store client
//!
//! ## Atomicity
//!
//! Records are spread over several shard actors by a hash of their id. A shard handles one
//! request at a time, so the status check and the write inside
//! [`DeliveryAction::Advance`] can never interleave with another write to the same record.
//! That is the whole compare-and-swap: no locks, no version retry loop inside the store.
//!
//! ## Usage
//!
//! ```rust
//! use delivery_tracking::clients::DeliveryStateStore;
//! use delivery_tracking::delivery_actor;
//! use delivery_tracking::model::{DeliveryCreate, DeliveryId, DeliveryStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (shards, store) = delivery_actor::new(4, 32);
//!     for shard in shards {
//!         tokio::spawn(shard.run(()));
//!     }
//!
//!     let id = DeliveryId::new("delivery_1");
//!     let params = DeliveryCreate {
//!         order_id: "order_1".into(),
//!         agent_id: "agent_1".into(),
//!         address: "12 Grant St".to_string(),
//!         fee: 4.5,
//!         estimated_at: None,
//!     };
//!     store.create(id.clone(), params).await?;
//!
//!     let committed = store
//!         .update_status(&id, DeliveryStatus::Assigned, DeliveryStatus::PickedUp, chrono::Utc::now())
//!         .await?;
//!     assert_eq!(committed.delivery.version, 1);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::*;
pub use error::*;

use crate::clients::StoreClient;
use actor_framework::ResourceActor;

/// Creates the store shards and a client routing to them.
///
/// Each returned actor must be spawned with `run(())`.
pub fn new(shards: usize, mailbox_size: usize) -> (Vec<ResourceActor<DeliveryRecord>>, StoreClient) {
    let (actors, client) = ResourceActor::sharded(shards, mailbox_size);
    (actors, StoreClient::new(client))
}
