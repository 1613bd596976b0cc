//! # Actor Framework
//!
//! Building blocks for type-safe, concurrent actor systems on Tokio, following a
//! **Resource-Oriented Architecture (ROA)** on top of the **Actor Model**:
//!
//! - Every resource type gets a uniform Create / Get / Update / Action API.
//! - State is owned by a task and changed only by messages, so there are no locks.
//! - One actor handles its messages strictly in order. That turns any check-then-write inside
//!   an entity hook into an atomic operation.
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model)
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your business logic and domain models
//! 2. **Runtime Layer** ([`ResourceActor`]) - Message processing and concurrency
//! 3. **Interface Layer** ([`ResourceClient`], [`ShardedClient`]) - Type-safe communication
//!
//! ## Sharding
//!
//! A single actor serializes *all* of its ids. [`ResourceActor::sharded`] starts several
//! actors for the same entity type and returns a [`ShardedClient`] that routes each id to
//! its owner, so unrelated ids never queue behind each other while operations on one id stay
//! serialized.
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Parcel { id: String, scans: u32 }
//! #[derive(Debug)] struct ParcelCreate;
//! #[derive(Debug)] struct ParcelUpdate;
//! #[derive(Debug)] enum ParcelAction { Scan }
//! #[derive(Debug, thiserror::Error)] #[error("parcel error")] struct ParcelError;
//!
//! #[async_trait]
//! impl ActorEntity for Parcel {
//!     type Id = String; type Create = ParcelCreate; type Update = ParcelUpdate;
//!     type Action = ParcelAction; type ActionResult = u32; type Context = (); type Error = ParcelError;
//!     fn from_create_params(id: String, _: ParcelCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, scans: 0 })
//!     }
//!     async fn on_update(&mut self, _: ParcelUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     async fn handle_action(&mut self, _: ParcelAction, _: &()) -> Result<u32, Self::Error> {
//!         self.scans += 1;
//!         Ok(self.scans)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actors, client) = ResourceActor::<Parcel>::sharded(4, 16);
//!     for actor in actors {
//!         tokio::spawn(actor.run(()));
//!     }
//!
//!     client.create("p1".to_string(), ParcelCreate).await.unwrap();
//!     let scans = client.perform_action("p1".to_string(), ParcelAction::Scan).await.unwrap();
//!     assert_eq!(scans, 1);
//! }
//! ```
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via `run(context)`, not at construction time.
//! Actors can be created first and wired afterwards, which avoids circular construction.
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers client requests from a queue of expectations, see the
//! [`mock`] module.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod shard;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
pub use shard::{shard_for, ShardedClient};
