//! # Domain Layer
//!
//! Envelope decryption and payload parsing with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod decryptor;
pub mod entities;
pub mod errors;
pub mod parser;
