//! Cross-crate integration tests.
//!
//! The crypto, types, telemetry and ingestion crates are wired together
//! exactly as an application would wire them.

pub mod pipeline;
pub mod store_contract;
