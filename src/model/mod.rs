//! Pure data structures shared by the store, the hub and the coordinator.

pub mod delivery;
pub mod event;
pub mod ids;
pub mod request;
pub mod status;

pub use delivery::*;
pub use event::*;
pub use ids::*;
pub use request::*;
pub use status::*;
