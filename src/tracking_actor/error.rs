//! Error types for the tracking hub.

use crate::delivery_actor::DeliveryError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// The hub shard owning the delivery has stopped.
    #[error("Tracking hub is not running")]
    HubClosed,

    /// Reading the snapshot failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
