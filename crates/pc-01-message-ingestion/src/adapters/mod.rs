//! # Adapters Layer
//!
//! Implementations of the outbound ports.
//!
//! - `memory_store`: identity and message store kept in process memory
//! - `key_provider`: fixed local key held in zeroizing memory
//! - `time_source`: system and fixed clocks

pub mod key_provider;
pub mod memory_store;
pub mod time_source;

pub use key_provider::StaticKeyProvider;
pub use memory_store::{InMemoryStore, StoreOp};
pub use time_source::{FixedTimeSource, SystemTimeSource};
