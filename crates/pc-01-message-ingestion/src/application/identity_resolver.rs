//! # Identity Resolver
//!
//! Find-or-create of the sender's identity, keyed by public key.
//!
//! Known identities take the incoming display name (last write wins) and
//! are persisted again; unknown keys get a new identity. Resolution is two
//! steps: [`IdentityResolver::prepare`] looks the key up and builds the
//! record without writing it, and the returned [`PendingIdentity`] writes
//! it, or undoes the write when the rest of the import fails.
//!
//! A `PendingIdentity` holds the per-key lock until it is finished or
//! dropped, so concurrent first messages from one sender yield exactly one
//! identity and never observe each other's half-done imports.

use std::sync::Arc;

use parley_telemetry::{IDENTITIES_CREATED, IDENTITIES_UPDATED};
use shared_types::{Identity, IdentityId, NewIdentity, StoreError};
use tracing::{debug, error, info};

use super::keyed_lock::{KeyedGuard, KeyedLocks};
use crate::domain::entities::SenderInfo;
use crate::ports::outbound::IdentityStore;

/// Upserts identities through an [`IdentityStore`].
pub struct IdentityResolver<S: ?Sized> {
    store: Arc<S>,
    locks: KeyedLocks<IdentityId>,
}

impl<S: IdentityStore + ?Sized> IdentityResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Look up `sender` and build the identity it resolves to, unwritten.
    ///
    /// Takes the sender's key lock; it is released when the returned value
    /// is finished, rolled back or dropped.
    ///
    /// # Errors
    ///
    /// Any `StoreError` from find or create. Nothing has been written.
    pub async fn prepare(&self, sender: &SenderInfo) -> Result<PendingIdentity<S>, StoreError> {
        let id = sender.identity_id();
        let guard = self.locks.lock(id.clone()).await;

        let (identity, previous) = match self.store.find_identity(&id).await? {
            Some(existing) => {
                let mut identity = existing.clone();
                identity.rename(&sender.display_name);
                (identity, Some(existing))
            }
            None => {
                let identity = self
                    .store
                    .create_identity(NewIdentity {
                        public_key: sender.public_key,
                        display_name: sender.display_name.clone(),
                    })
                    .await?;
                (identity, None)
            }
        };

        Ok(PendingIdentity {
            identity,
            previous,
            store: Arc::clone(&self.store),
            _guard: guard,
        })
    }

    /// Resolve `sender` to a persisted identity in one step.
    ///
    /// # Errors
    ///
    /// Any `StoreError` from find, create or persist. On a failed persist of
    /// a known identity the store keeps its previous name.
    pub async fn resolve(&self, sender: &SenderInfo) -> Result<Identity, StoreError> {
        let pending = self.prepare(sender).await?;
        pending.persist().await?;
        Ok(pending.finish())
    }
}

/// A resolved identity that is not yet settled in the store.
///
/// Owns everything it needs, so it can be moved into a spawned task.
pub struct PendingIdentity<S: ?Sized> {
    identity: Identity,
    previous: Option<Identity>,
    store: Arc<S>,
    _guard: KeyedGuard<IdentityId>,
}

impl<S: IdentityStore + ?Sized> PendingIdentity<S> {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// No record existed for this key before the import.
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }

    /// Write the identity. On error the store holds what it held before.
    pub async fn persist(&self) -> Result<(), StoreError> {
        self.store.persist_identity(&self.identity).await
    }

    /// Undo a successful [`persist`](Self::persist): restore the prior
    /// record, or discard the one this import created.
    ///
    /// Failures are logged; the caller is already reporting the error that
    /// made the rollback necessary.
    pub async fn rollback(self) {
        let result = match &self.previous {
            Some(previous) => self.store.persist_identity(previous).await,
            None => self.store.discard_identity(&self.identity.id).await,
        };

        match result {
            Ok(()) => debug!(identity_id = %self.identity.id.short(), "Rolled back identity"),
            Err(e) => error!(
                identity_id = %self.identity.id.short(),
                error = %e,
                "Identity rollback failed"
            ),
        }
    }

    /// Release the lock and return the settled identity.
    pub fn finish(self) -> Identity {
        let id = self.identity.id.short();
        match &self.previous {
            Some(previous) => {
                IDENTITIES_UPDATED.inc();
                let renamed = previous.display_name != self.identity.display_name;
                debug!(identity_id = %id, renamed, "Resolved known identity");
            }
            None => {
                IDENTITIES_CREATED.inc();
                info!(identity_id = %id, "Created identity for new sender");
            }
        }
        self.identity
    }
}
