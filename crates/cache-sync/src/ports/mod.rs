//! Ports (interfaces) for the cache sync core.

pub mod outbound;

pub use outbound::{Broker, BrokerError};
