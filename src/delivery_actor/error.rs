//! Error types for the Delivery actor and everything that drives it.

use crate::model::{ActorId, DeliveryId, DeliveryStatus};
use actor_framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during delivery operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    /// The requested delivery was not found.
    #[error("Delivery not found: {0}")]
    NotFound(DeliveryId),

    /// A delivery with this id already exists.
    #[error("Delivery already exists: {0}")]
    AlreadyExists(DeliveryId),

    /// The stored status no longer matches the status the transition started from.
    #[error("Delivery {id} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        id: DeliveryId,
        expected: DeliveryStatus,
        actual: DeliveryStatus,
    },

    /// The requested status is not reachable from the current one.
    #[error("Delivery {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: DeliveryId,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    /// The actor may not perform this operation on this delivery.
    #[error("Actor {actor} is not allowed to modify delivery {id}")]
    Forbidden { id: DeliveryId, actor: ActorId },

    /// The request payload is malformed.
    #[error("Invalid delivery request: {0}")]
    Invalid(String),

    /// The store could not be reached. Safe to retry with backoff.
    #[error("Delivery store unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of a [`DeliveryError`], for transports that map errors onto
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidTransition,
    Forbidden,
    Invalid,
    Unavailable,
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::NotFound(_) => ErrorKind::NotFound,
            DeliveryError::AlreadyExists(_) | DeliveryError::Conflict { .. } => ErrorKind::Conflict,
            DeliveryError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DeliveryError::Forbidden { .. } => ErrorKind::Forbidden,
            DeliveryError::Invalid(_) => ErrorKind::Invalid,
            DeliveryError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether re-reading and re-issuing the request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Conflict { .. } | DeliveryError::Unavailable(_)
        )
    }

    /// Maps a framework failure for delivery `id` into a delivery error.
    pub(crate) fn from_framework(id: &DeliveryId, e: FrameworkError) -> Self {
        match e.into_entity::<DeliveryError>() {
            Ok(entity) => entity,
            Err(FrameworkError::NotFound(_)) => DeliveryError::NotFound(id.clone()),
            Err(FrameworkError::AlreadyExists(_)) => DeliveryError::AlreadyExists(id.clone()),
            Err(other) => DeliveryError::Unavailable(other.to_string()),
        }
    }
}
