//! In-memory broker adapter.
//!
//! A TTL-aware keyspace plus broadcast fan-out, suitable for single-node
//! wiring and tests. Distributed deployments implement [`Broker`] over a
//! real store/bus (e.g. Redis). Expired entries are reaped lazily: they
//! are invisible to `get` and report a zero remaining TTL, but may still
//! appear in `scan` results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::ports::outbound::{Broker, BrokerError};
use crate::DEFAULT_CHANNEL_CAPACITY;

struct StoredValue {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process implementation of the [`Broker`] port.
pub struct InMemoryBroker {
    keyspace: RwLock<HashMap<String, StoredValue>>,
    channels: RwLock<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keyspace: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the fan-out sender for a channel.
    fn channel(&self, name: &str) -> broadcast::Sender<Vec<u8>> {
        self.channels
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| broadcast::channel(DEFAULT_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn ping(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), BrokerError> {
        self.keyspace.write().insert(
            key.to_owned(),
            StoredValue {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BrokerError> {
        let keyspace = self.keyspace.read();
        match keyspace.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.value.clone()),
            _ => Err(BrokerError::NotFound(key.to_owned())),
        }
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Duration, BrokerError> {
        let keyspace = self.keyspace.read();
        match keyspace.get(key) {
            Some(entry) => Ok(entry.expires_at.saturating_duration_since(Instant::now())),
            None => Err(BrokerError::NotFound(key.to_owned())),
        }
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BrokerError> {
        Ok(self
            .keyspace
            .read()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        // A send error only means no subscriber is listening right now,
        // which is not a failure for fan-out.
        let _ = self.channel(channel).send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<Vec<u8>>, BrokerError> {
        let mut source = self.channel(channel).subscribe();
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        debug!(lagged = count, "subscriber lagged, messages dropped");
                    }
                }
            }
        });

        Ok(rx)
    }
}
