//! Records handed to the host cache, the error taxonomy, and sync
//! counters.

use std::sync::atomic::{AtomicU64, Ordering};

use hickory_proto::op::Message;
use thiserror::Error;

use crate::ports::outbound::BrokerError;
use crate::EXTERNAL_CACHE_REASON;

/// Provenance of a cache record.
///
/// Informs the consumer's trust/merge policy; not interpreted here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Produced by this instance's resolver and published to peers.
    LocalPublish,
    /// Received from a peer over the broadcast channel.
    PeerBroadcast,
    /// Read from the shared store during startup bulk load.
    BulkLoad,
}

/// Marker for how a response was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the shared external cache.
    ExternalCache,
}

/// Decoded answer handed to the host cache.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub source: ResponseSource,
    pub reason: &'static str,
    pub message: Message,
}

impl CachedResponse {
    /// Wrap an answer received from the shared cache.
    pub fn external(message: Message) -> Self {
        Self {
            source: ResponseSource::ExternalCache,
            reason: EXTERNAL_CACHE_REASON,
            message,
        }
    }
}

/// A cache entry relayed between the sync core and the host cache.
///
/// Transient: the core never retains records, it only relays them.
#[derive(Clone, Debug)]
pub struct CacheRecord {
    pub key: String,
    pub origin: RecordOrigin,
    pub response: CachedResponse,
}

/// Cache synchronization errors.
///
/// Only [`SyncError::Broker`] at construction time is fatal; everything
/// else is contained inside the core and reduced to a log line.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Broker connectivity or operation failure.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("envelope encode failed: {0}")]
    Encode(String),

    #[error("envelope decode failed: {0}")]
    Decode(String),
}

/// Counters for message dispositions inside the sync engine.
///
/// Distinguishes forwarded traffic from self-dropped and undecodable
/// traffic. Relaxed atomics; read via [`SyncMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct SyncMetrics {
    published: AtomicU64,
    forwarded: AtomicU64,
    self_dropped: AtomicU64,
    decode_failures: AtomicU64,
}

impl SyncMetrics {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_self_dropped(&self) {
        self.self_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        SyncMetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            self_dropped: self.self_dropped.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`SyncMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncMetricsSnapshot {
    pub published: u64,
    pub forwarded: u64,
    pub self_dropped: u64,
    pub decode_failures: u64,
}
