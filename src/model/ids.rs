//! Type-safe identifiers.
//!
//! All identifiers are opaque strings issued by collaborators: the order service names
//! deliveries and orders, the authentication layer names actors, the transport names viewers.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a delivery record.
    DeliveryId
);
string_id!(
    /// Identifier of the order a delivery fulfils.
    OrderId
);
string_id!(
    /// Verified identity of whoever issues a request (delivery agent or operator).
    ActorId
);
string_id!(
    /// Handle of one live connection watching a delivery.
    ViewerId
);
