//! # Store Contract Tests
//!
//! Drives `receive` against hand-written store doubles behind trait objects
//! and checks the order and arguments of every collaborator call, including
//! the rollback writes after a failed message persist.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pc_01_message_ingestion::testing;
    use pc_01_message_ingestion::{
        IdentityStore, ImportStage, MessageIngestionApi, MessageIngestionService, MessageStore,
        StaticKeyProvider,
    };
    use shared_crypto::BoxKeyPair;
    use shared_types::{
        Identity, IdentityId, Message, MessageId, NewIdentity, NewMessage, StoreError,
    };

    type Log = Arc<Mutex<Vec<String>>>;

    /// Identity store that records calls.
    struct RecordingIdentities {
        log: Log,
        records: Mutex<HashMap<IdentityId, Identity>>,
    }

    #[async_trait]
    impl IdentityStore for RecordingIdentities {
        async fn find_identity(&self, id: &IdentityId) -> Result<Option<Identity>, StoreError> {
            self.log.lock().push("find_identity".into());
            Ok(self.records.lock().get(id).cloned())
        }

        async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, StoreError> {
            self.log
                .lock()
                .push(format!("create_identity:{}", fields.display_name));
            Ok(fields.into())
        }

        async fn persist_identity(&self, identity: &Identity) -> Result<(), StoreError> {
            self.log
                .lock()
                .push(format!("persist_identity:{}", identity.display_name));
            self.records
                .lock()
                .insert(identity.id.clone(), identity.clone());
            Ok(())
        }

        async fn discard_identity(&self, id: &IdentityId) -> Result<(), StoreError> {
            self.log.lock().push("discard_identity".into());
            self.records.lock().remove(id);
            Ok(())
        }
    }

    /// Message store that records calls and can refuse to persist.
    struct RecordingMessages {
        log: Log,
        refuse_persist: Arc<AtomicBool>,
    }

    #[async_trait]
    impl MessageStore for RecordingMessages {
        async fn create_message(&self, fields: NewMessage) -> Result<Message, StoreError> {
            self.log
                .lock()
                .push(format!("create_message:{}", fields.from));
            Ok(fields.into_message(MessageId::generate()))
        }

        async fn persist_message(&self, message: &Message) -> Result<(), StoreError> {
            self.log
                .lock()
                .push(format!("persist_message:{}", message.body));
            if self.refuse_persist.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("read-only".into()));
            }
            Ok(())
        }
    }

    type DynService = MessageIngestionService<dyn IdentityStore, dyn MessageStore>;

    fn setup(refuse_persist: bool) -> (BoxKeyPair, Log, DynService) {
        let (local, log, service, _) = setup_switchable(refuse_persist);
        (local, log, service)
    }

    fn setup_switchable(refuse_persist: bool) -> (BoxKeyPair, Log, DynService, Arc<AtomicBool>) {
        let local = BoxKeyPair::generate();
        let log: Log = Arc::default();
        let refuse_persist = Arc::new(AtomicBool::new(refuse_persist));

        let identities: Arc<dyn IdentityStore> = Arc::new(RecordingIdentities {
            log: log.clone(),
            records: Mutex::default(),
        });
        let messages: Arc<dyn MessageStore> = Arc::new(RecordingMessages {
            log: log.clone(),
            refuse_persist: refuse_persist.clone(),
        });
        let service = MessageIngestionService::new(
            identities,
            messages,
            Arc::new(StaticKeyProvider::from_secret(&local.secret_key)),
        );

        (local, log, service, refuse_persist)
    }

    #[tokio::test]
    async fn test_call_order_for_new_then_known_sender() {
        let (local, log, service) = setup(false);
        let alice = BoxKeyPair::generate();

        for (name, body) in [("Alice", "one"), ("Alice2", "two")] {
            let envelope = testing::envelope(
                &testing::payload(&alice, name, body),
                &alice,
                &local.public_key,
            );
            service.receive(envelope).await.unwrap();
        }

        assert_eq!(
            *log.lock(),
            vec![
                "find_identity",
                "create_identity:Alice",
                "create_message:Alice",
                "persist_identity:Alice",
                "persist_message:one",
                "find_identity",
                "create_message:Alice2",
                "persist_identity:Alice2",
                "persist_message:two",
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_envelope_touches_no_store() {
        let (local, log, service) = setup(false);
        let alice = BoxKeyPair::generate();
        let envelope = testing::corrupt_tag(&testing::envelope(
            &testing::payload(&alice, "Alice", "hi"),
            &alice,
            &local.public_key,
        ));

        assert!(service.receive(envelope).await.is_err());
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_rolls_back_new_identity() {
        let (local, log, service) = setup(true);
        let alice = BoxKeyPair::generate();
        let envelope = testing::envelope(
            &testing::payload(&alice, "Alice", "hi"),
            &alice,
            &local.public_key,
        );

        let err = service.receive(envelope).await.unwrap_err();

        assert_eq!(err.stage(), ImportStage::PersistMessage);
        assert_eq!(
            log.lock()[3..],
            ["persist_identity:Alice", "persist_message:hi", "discard_identity"]
        );

        // Nothing survived: the next delivery is a first contact again.
        let envelope = testing::envelope(
            &testing::payload(&alice, "Alice", "again"),
            &alice,
            &local.public_key,
        );
        service.receive(envelope).await.unwrap_err();
        assert_eq!(log.lock()[7], "create_identity:Alice");
    }

    #[tokio::test]
    async fn test_persist_failure_restores_known_identity() {
        let (local, log, service, refuse_persist) = setup_switchable(false);
        let alice = BoxKeyPair::generate();
        let envelope = |name: &str| {
            testing::envelope(
                &testing::payload(&alice, name, "hi"),
                &alice,
                &local.public_key,
            )
        };

        service.receive(envelope("Alice")).await.unwrap();
        refuse_persist.store(true, Ordering::SeqCst);
        service.receive(envelope("Alice2")).await.unwrap_err();

        // The rename is written, then the prior record is written back.
        assert_eq!(
            log.lock()[5..],
            [
                "find_identity",
                "create_message:Alice2",
                "persist_identity:Alice2",
                "persist_message:hi",
                "persist_identity:Alice",
            ]
        );
    }
}
