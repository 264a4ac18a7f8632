//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API the relay connection calls
//! - **Outbound (Driven)**: Persistence, key material and clock

pub mod inbound;
pub mod outbound;
