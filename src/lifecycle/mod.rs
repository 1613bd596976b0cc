//! # System Lifecycle
//!
//! Starting, wiring and stopping the delivery tracking service.
//!
//! ## Wiring
//!
//! Actors are created without their dependencies and receive them when `run` starts:
//!
//! ```text
//! store shards   run(())
//! hub shards     run(Arc<dyn DeliveryStateStore>)   reads snapshots on subscribe
//! coordinator    store + hub clients                 writes, then publishes
//! ```
//!
//! The dependency graph is acyclic, so closing channels is enough to stop everything:
//! once the last client of a shard is dropped its loop ends.
//!
//! ## Observability
//!
//! [`setup_tracing`] installs the log subscriber. Call it once, from the binary.

pub mod delivery_system;
pub mod tracing;

pub use delivery_system::*;
pub use tracing::*;
