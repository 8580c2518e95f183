//! Cross-module integration flows.

pub mod sampling_flows;
pub mod session_flows;
pub mod sync_flows;
