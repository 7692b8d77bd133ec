//! Cross-instance integration flows.

pub mod sync_flows;
