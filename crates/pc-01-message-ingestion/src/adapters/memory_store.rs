use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{Identity, IdentityId, Message, MessageId, NewIdentity, NewMessage, StoreError};

use crate::ports::outbound::{IdentityStore, MessageStore};

/// Store operation, used to target failure injection and call counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindIdentity,
    CreateIdentity,
    PersistIdentity,
    DiscardIdentity,
    CreateMessage,
    PersistMessage,
}

#[derive(Default)]
struct MessageLog {
    ordered: Vec<Message>,
    ids: HashSet<MessageId>,
}

/// In-memory identity and message store.
///
/// Records become visible to `find_identity` only once persisted.
/// `create_identity` for an id that is already persisted fails with
/// `StoreError::Conflict`, so a racing double-create surfaces instead of
/// silently producing two records.
#[derive(Default)]
pub struct InMemoryStore {
    identities: RwLock<HashMap<IdentityId, Identity>>,
    messages: RwLock<MessageLog>,
    failures: Mutex<HashMap<StoreOp, StoreError>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
    latency: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every operation, widening race windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every subsequent `op` fail with `error`.
    pub fn fail_on(&self, op: StoreOp, error: StoreError) {
        self.failures.lock().insert(op, error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Number of times `op` was invoked, including failed calls.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Insert an identity directly, bypassing the port.
    pub fn seed_identity(&self, identity: Identity) {
        self.identities.write().insert(identity.id.clone(), identity);
    }

    pub fn identity(&self, id: &IdentityId) -> Option<Identity> {
        self.identities.read().get(id).cloned()
    }

    pub fn identities(&self) -> Vec<Identity> {
        let mut all: Vec<_> = self.identities.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Persisted messages in persistence order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.read().ordered.clone()
    }

    async fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.failures.lock().get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_identity(&self, id: &IdentityId) -> Result<Option<Identity>, StoreError> {
        self.enter(StoreOp::FindIdentity).await?;
        Ok(self.identity(id))
    }

    async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, StoreError> {
        self.enter(StoreOp::CreateIdentity).await?;

        let id = fields.id();
        if self.identities.read().contains_key(&id) {
            return Err(StoreError::Conflict { id: id.to_string() });
        }
        Ok(Identity::from(fields))
    }

    async fn persist_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        self.enter(StoreOp::PersistIdentity).await?;
        self.seed_identity(identity.clone());
        Ok(())
    }

    async fn discard_identity(&self, id: &IdentityId) -> Result<(), StoreError> {
        self.enter(StoreOp::DiscardIdentity).await?;
        self.identities.write().remove(id);
        Ok(())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create_message(&self, fields: NewMessage) -> Result<Message, StoreError> {
        self.enter(StoreOp::CreateMessage).await?;
        Ok(fields.into_message(MessageId::generate()))
    }

    async fn persist_message(&self, message: &Message) -> Result<(), StoreError> {
        self.enter(StoreOp::PersistMessage).await?;

        let mut log = self.messages.write();
        if !log.ids.insert(message.id) {
            return Err(StoreError::Conflict {
                id: message.id.to_string(),
            });
        }
        log.ordered.push(message.clone());
        Ok(())
    }
}
