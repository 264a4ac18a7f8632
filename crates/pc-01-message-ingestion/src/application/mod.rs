//! # Application Layer
//!
//! Orchestrates the domain logic against the outbound ports.

pub mod identity_resolver;
pub mod keyed_lock;
pub mod service;

pub use identity_resolver::{IdentityResolver, PendingIdentity};
pub use keyed_lock::{KeyedGuard, KeyedLocks};
pub use service::MessageIngestionService;
