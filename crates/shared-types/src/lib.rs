//! # Shared Types Crate
//!
//! Entities and errors shared by every Parley crate and by the persistence
//! collaborator that backs the ingestion pipeline.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Identity` and `Message` are defined once here.
//! - **Key-Derived Identity**: an identity's id is the lowercase hex of its
//!   32-byte public key and never changes after creation.
//! - **Explicit Failure**: the store boundary reports failures as
//!   [`StoreError`]; "not found" is an `Option`, never an error.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
