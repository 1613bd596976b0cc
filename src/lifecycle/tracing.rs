//! # Logging
//!
//! Log lines are compact and leave out the module path. Every actor and client logs with
//! structured fields (`delivery_id`, `viewer`, `version`), so one delivery can be followed
//! through the store, the coordinator and the hub with a simple filter.
//!
//! ```bash
//! RUST_LOG=info cargo run     # lifecycle, commits, subscriptions
//! RUST_LOG=debug cargo run    # payloads, fan-out, stale and held events
//! ```
//!
//! With `RUST_LOG=info` a delivery walking its lifecycle reads roughly like:
//!
//! ```text
//! INFO Created entity_type="DeliveryRecord" id=delivery_1 size=1
//! INFO create_delivery{id=DeliveryId("delivery_1")}: Delivery assigned agent_id=agent_1
//! INFO Subscribed delivery_id=delivery_1 viewer=viewer_1 version=0 replaced=false viewers=1
//! INFO request_transition{delivery_id=delivery_1 to=picked_up actor=agent_1}: Transition committed version=1 from=assigned
//! INFO Delivery finished, closing streams delivery_id=delivery_1 viewers=2
//! ```

/// Installs the global subscriber, filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
