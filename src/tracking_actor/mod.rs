//! # Tracking Actor
//!
//! The live side of the system: which viewers watch which delivery, and the fan-out of
//! status changes and agent positions to them.
//!
//! ## Structure
//!
//! - [`shard`] - [`TrackingShard`], the actor owning one part of the registry
//! - [`message`] - [`HubRequest`] mailbox protocol, [`Registration`] and [`HubStats`]
//! - [`error`] - [`TrackingError`]
//! - [`new()`] - Factory function that creates the shards and the [`TrackingHub`] client
//!
//! ## Guarantees
//!
//! - Deliveries are routed to shards with [`shard_for`](actor_framework::shard_for), the
//!   same routing the store uses. A shard handles one message at a time.
//! - Every viewer of a delivery sees status events in version order, without gaps. An
//!   event arriving ahead of its predecessor pulls the missing ones from the store's audit
//!   trail; stale ones are dropped.
//! - A viewer never receives an event its snapshot already reflects.
//! - Fan-out never waits on a viewer. A viewer whose queue is full is disconnected.
//! - The registry entry of a delivery disappears with its last viewer, and right after
//!   its terminal event.

pub mod error;
pub mod message;
pub mod shard;

pub use error::*;
pub use message::*;
pub use shard::*;

use crate::clients::TrackingHub;

/// Creates the hub shards and the client routing to them.
///
/// Each returned shard must be spawned with `run(store)`.
pub fn new(
    shards: usize,
    mailbox_size: usize,
    viewer_buffer: usize,
) -> (Vec<TrackingShard>, TrackingHub) {
    let (actors, senders): (Vec<_>, Vec<_>) = (0..shards.max(1))
        .map(|_| TrackingShard::new(mailbox_size, viewer_buffer))
        .unzip();
    (actors, TrackingHub::new(senders))
}
