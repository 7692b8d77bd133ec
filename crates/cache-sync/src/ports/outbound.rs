//! Outbound port (SPI): the external key/value store plus
//! publish/subscribe bus.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Broker operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("subscription closed")]
    Closed,

    #[error("broker i/o error: {0}")]
    Io(String),
}

/// Key/value store plus publish/subscribe bus.
///
/// The single external seam of the sync core. Implementations must be
/// safe for concurrent use: the coordinating loop and the bulk loader
/// share one broker handle. Connection retry, backoff, and operation
/// timeouts are the implementation's concern; the core adds no timeout
/// layer of its own.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Reachability probe, used once at engine construction.
    async fn ping(&self) -> Result<(), BrokerError>;

    /// Persist a value under `key` with the given expiry.
    ///
    /// Overwrite semantics: a re-publish of the same key replaces the
    /// previous value and restarts its lifetime.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), BrokerError>;

    /// Read the current value of `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BrokerError>;

    /// Remaining lifetime of `key`; zero when the entry has expired but
    /// not yet been reaped.
    async fn remaining_ttl(&self, key: &str) -> Result<Duration, BrokerError>;

    /// All keys under `prefix`, in store-iteration order (unspecified).
    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BrokerError>;

    /// Broadcast a payload to every subscriber of `channel`.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Subscribe to `channel`; messages arrive on the returned receiver.
    ///
    /// The receiver closing signals a lost subscription.
    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<Vec<u8>>, BrokerError>;
}
