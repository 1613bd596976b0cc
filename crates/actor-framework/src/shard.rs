//! # Sharding
//!
//! A single actor serializes every request it receives. That is exactly what a single
//! record needs, and far more than a whole table needs. [`ShardedClient`] spreads the ids
//! of one entity type over several independent actors: requests for the same id always
//! land on the same actor (and are therefore serialized), requests for ids on different
//! actors run in parallel.
//!
//! [`shard_for`] is exposed so that other registries keyed by the same ids can use the
//! same routing.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Picks the shard that owns `key` out of `shards` shards.
///
/// Stable for the lifetime of the process. `shards` of zero is treated as one.
pub fn shard_for<K: Hash + ?Sized>(key: &K, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % shards.max(1) as u64) as usize
}

/// A client that routes each request to the shard owning its id.
///
/// Exposes the same API as [`ResourceClient`].
pub struct ShardedClient<T: ActorEntity> {
    shards: Vec<ResourceClient<T>>,
}

impl<T: ActorEntity> Clone for ShardedClient<T> {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
        }
    }
}

impl<T: ActorEntity> ShardedClient<T> {
    /// Wraps already-running shard clients.
    ///
    /// # Panics
    /// Panics if `shards` is empty.
    pub fn new(shards: Vec<ResourceClient<T>>) -> Self {
        assert!(!shards.is_empty(), "ShardedClient needs at least one shard");
        Self { shards }
    }

    /// Number of shards behind this client.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The client of the shard owning `id`.
    pub fn shard(&self, id: &T::Id) -> &ResourceClient<T> {
        &self.shards[shard_for(id, self.shards.len())]
    }

    pub async fn create(&self, id: T::Id, params: T::Create) -> Result<T, FrameworkError> {
        self.shard(&id).create(id, params).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.shard(&id).get(id).await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        self.shard(&id).update(id, update).await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.shard(&id).perform_action(id, action).await
    }
}
