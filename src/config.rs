//! Runtime configuration, read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DELIVERY_STORE_SHARDS` | 8 |
//! | `DELIVERY_HUB_SHARDS` | 8 |
//! | `DELIVERY_MAILBOX_SIZE` | 64 |
//! | `DELIVERY_VIEWER_BUFFER` | 16 |
//! | `DELIVERY_EVENT_FEED_CAPACITY` | 256 |
//! | `DELIVERY_OPERATORS` | empty |

use crate::model::ActorId;
use std::{env, fmt::Display, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryConfig {
    pub store_shards: usize,
    pub hub_shards: usize,
    pub mailbox_size: usize,
    /// Outbound queue length per viewer. A viewer that falls this far behind is dropped.
    pub viewer_buffer: usize,
    pub event_feed_capacity: usize,
    /// Actors allowed to cancel any delivery.
    pub operators: Vec<ActorId>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            store_shards: 8,
            hub_shards: 8,
            mailbox_size: 64,
            viewer_buffer: 16,
            event_feed_capacity: 256,
            operators: Vec::new(),
        }
    }
}

impl DeliveryConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Loads from an arbitrary lookup instead of the process environment.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            store_shards: try_load(&lookup, "DELIVERY_STORE_SHARDS", defaults.store_shards)?,
            hub_shards: try_load(&lookup, "DELIVERY_HUB_SHARDS", defaults.hub_shards)?,
            mailbox_size: try_load(&lookup, "DELIVERY_MAILBOX_SIZE", defaults.mailbox_size)?,
            viewer_buffer: try_load(&lookup, "DELIVERY_VIEWER_BUFFER", defaults.viewer_buffer)?,
            event_feed_capacity: try_load(
                &lookup,
                "DELIVERY_EVENT_FEED_CAPACITY",
                defaults.event_feed_capacity,
            )?,
            operators: lookup("DELIVERY_OPERATORS")
                .map(|raw| parse_operators(&raw))
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("DELIVERY_STORE_SHARDS", self.store_shards),
            ("DELIVERY_HUB_SHARDS", self.hub_shards),
            ("DELIVERY_MAILBOX_SIZE", self.mailbox_size),
            ("DELIVERY_VIEWER_BUFFER", self.viewer_buffer),
            ("DELIVERY_EVENT_FEED_CAPACITY", self.event_feed_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(key));
            }
        }
        Ok(())
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };
    raw.trim().parse::<T>().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }
    })
}

fn parse_operators(raw: &str) -> Vec<ActorId> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ActorId::from)
        .collect()
}
