//! Pure domain logic: wire envelope codec, TTL policy, key namespacing,
//! and configuration. No broker or runtime dependencies.

pub mod config;
pub mod envelope;
pub mod keys;
pub mod ttl;

pub use config::SyncConfig;
pub use envelope::{decode, encode, WireEnvelope};
pub use keys::{prefix_key, strip_prefix};
pub use ttl::{derive_store_ttl, restamp_on_read};
