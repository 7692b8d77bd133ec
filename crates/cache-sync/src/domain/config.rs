//! Cache synchronization configuration.
//!
//! Loaded by the host's config layer and consumed here. The broker
//! transport owns connection retry and backoff; the attempt and cooldown
//! fields are passed through to it.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_CHANNEL_CAPACITY;

/// Configuration for the cache sync core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Broker address. Empty disables cache synchronization entirely.
    pub address: String,

    /// Broker credential.
    pub password: Option<String>,

    /// Logical database index on the broker.
    pub database: u32,

    /// Connection attempts before the broker transport gives up.
    pub connection_attempts: u32,

    /// Cooldown between connection attempts, in milliseconds.
    pub connection_cooldown_ms: u64,

    /// Capacity of the outbound queue and the record channel.
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            password: None,
            database: 0,
            connection_attempts: 3,
            connection_cooldown_ms: 1_000,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Whether a broker address is configured at all.
    pub fn enabled(&self) -> bool {
        !self.address.is_empty()
    }

    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            address: "mem://local".to_owned(),
            password: None,
            database: 0,
            connection_attempts: 1,
            connection_cooldown_ms: 10,
            channel_capacity: 16,
        }
    }
}
