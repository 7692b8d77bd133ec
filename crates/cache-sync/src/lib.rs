//! # Cache Sync - Distributed DNS Answer Cache Synchronization
//!
//! Lets independent dnsmesh instances share one answer cache through a
//! remote key/value store with publish/subscribe fan-out. Any instance
//! that resolves a name publishes the answer so peers can reuse it; a
//! restarting instance warms its in-memory cache from the shared store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐   set / publish   ┌────────┐
//! │ Host resolver│ ───────────→ │  CacheSync   │ ────────────────→ │ Broker │
//! │  (instance A)│              │ (coord. loop)│ ←──────────────── │ store+ │
//! └──────────────┘              └──────┬───────┘    subscription   │  bus   │
//!                                      │ records                   └────────┘
//!                                      ▼                               ↑
//!                               ┌──────────────┐                       │
//!                               │  Host cache  │      instance B ──────┘
//!                               └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Self-loop prevention:** every outbound envelope carries a
//!   per-process origin identifier; inbound envelopes with our own
//!   identifier are discarded, never forwarded.
//! - **Best-effort persistence:** the store write and the channel
//!   broadcast are independent fallible operations. Neither rolls the
//!   other back, and a transient failure never stalls the loop.
//! - **Bounded backpressure:** the outbound queue and the consumer-facing
//!   record channel are bounded; senders wait instead of dropping.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::time::Duration;

pub mod adapters;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::InMemoryBroker;
pub use domain::config::SyncConfig;
pub use domain::envelope::WireEnvelope;
pub use events::{
    CacheRecord, CachedResponse, RecordOrigin, ResponseSource, SyncError, SyncMetricsSnapshot,
};
pub use ports::outbound::{Broker, BrokerError};
pub use service::{CacheSync, OriginId};

/// Pub/sub channel shared by every instance.
pub const CACHE_CHANNEL: &str = "dnsmesh_sync";

/// Namespace prefix for answers persisted in the shared store.
pub const CACHE_KEY_PREFIX: &str = "dnsmesh:cache:";

/// Bounded capacity of the outbound queue and the record channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Fallback store TTL for answers carrying no usable record TTL.
///
/// Deliberately short: a missing TTL usually signals a synthetic or
/// non-cacheable answer that must not linger in the shared store.
pub const DEFAULT_STORE_TTL: Duration = Duration::from_secs(1);

/// Reason tag attached to records served from the shared cache.
pub const EXTERNAL_CACHE_REASON: &str = "EXTERNAL_CACHE";
