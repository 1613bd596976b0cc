//! # Delivery Tracking
//!
//! Keeps each order's delivery status consistent between its durable record and every
//! live viewer watching it.
//!
//! ## Architecture
//!
//! - **[`delivery_actor`]**: the store. Sharded resource actors own the delivery records and
//!   commit status changes with a compare-and-swap.
//! - **[`tracking_actor`]**: the hub. Sharded actors own the viewer registry and fan status
//!   events and agent positions out to bounded per-viewer queues.
//! - **[`clients`]**: [`DeliveryStateStore`](clients::DeliveryStateStore),
//!   [`TrackingHub`](clients::TrackingHub), and the
//!   [`DeliveryCoordinator`](clients::DeliveryCoordinator) that validates, authorizes,
//!   commits and publishes every transition.
//! - **[`lifecycle`]**: [`DeliverySystem`](lifecycle::DeliverySystem) starts and stops all of
//!   it; [`setup_tracing`](lifecycle::setup_tracing) installs logging.
//! - **[`model`]**: ids, the status state machine, records, events and requests.
//! - **[`config`]**: [`DeliveryConfig`](config::DeliveryConfig), loaded from the environment.
//!
//! ## Lifecycle
//!
//! ```text
//! assigned ──► picked_up ──► delivering ──► delivered
//!     └────────────┴──────────────┴───────► cancelled
//! ```
//!
//! Forward moves are made by the assigned agent, one stage at a time. Cancellation is open
//! to the agent and to operators. Nothing leaves `delivered` or `cancelled`.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod delivery_actor;
pub mod lifecycle;
pub mod model;
pub mod tracking_actor;
