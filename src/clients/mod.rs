//! Domain-facing clients over the store and hub actors, and the coordinator that drives them.

pub mod coordinator;
pub mod store_client;
pub mod tracking_client;

pub use coordinator::*;
pub use store_client::*;
pub use tracking_client::*;
