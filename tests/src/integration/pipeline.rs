//! # Pipeline Integration Tests
//!
//! Envelopes are sealed with `shared-crypto` exactly as a remote peer would
//! seal them, then fed through `MessageIngestionService::receive` against
//! the in-memory store.
//!
//! ## Flows Tested:
//!
//! 1. **First contact**: unknown key creates an identity and a message
//! 2. **Rename**: a known key with a new name updates the identity in place
//! 3. **Rejection**: tampered, misaddressed and malformed envelopes persist nothing
//! 4. **Telemetry**: counters move with outcomes

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use pc_01_message_ingestion::testing;
    use pc_01_message_ingestion::{
        DecryptError, FixedTimeSource, ImportError, ImportErrorKind, ImportStage,
        InMemoryStore, IngestionConfig, MessageIngestionApi, MessageIngestionService,
        ParseError, RawEnvelope, StaticKeyProvider,
    };
    use parley_telemetry::{gather_metrics, register_metrics, ENVELOPES_RECEIVED, IMPORT_FAILURES};
    use serde_json::json;
    use shared_crypto::{BoxCipher, BoxKeyPair};
    use shared_types::IdentityId;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Node {
        keys: BoxKeyPair,
        store: Arc<InMemoryStore>,
        service: MessageIngestionService<InMemoryStore, InMemoryStore>,
    }

    fn node_with(config: IngestionConfig) -> Node {
        let keys = BoxKeyPair::generate();
        let store = Arc::new(InMemoryStore::new());
        let service = MessageIngestionService::with_config(
            store.clone(),
            store.clone(),
            Arc::new(StaticKeyProvider::from_secret(&keys.secret_key)),
            config,
        )
        .with_time_source(Arc::new(FixedTimeSource::new(
            Utc.timestamp_opt(1_690_000_060, 0).unwrap(),
        )));

        Node {
            keys,
            store,
            service,
        }
    }

    fn node() -> Node {
        node_with(IngestionConfig::default())
    }

    fn from(sender: &BoxKeyPair, name: &str, body: &str, to: &Node) -> RawEnvelope {
        testing::envelope(&testing::payload(sender, name, body), sender, &to.keys.public_key)
    }

    // =============================================================================
    // FIRST CONTACT AND RENAME
    // =============================================================================

    #[tokio::test]
    async fn test_first_contact_creates_identity_and_message() {
        let bob = node();
        let alice = BoxKeyPair::generate();

        let message = bob.service.receive(from(&alice, "Alice", "hi", &bob)).await.unwrap();

        let identities = bob.store.identities();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].id, IdentityId::from_public_key(&alice.public_key));
        assert_eq!(identities[0].display_name, "Alice");

        assert_eq!(message.from, "Alice");
        assert_eq!(message.body, "hi");
        assert_eq!(message.channel, "general");
        assert_eq!(message.thread, "t1");
        assert_eq!(message.content_type, "text");
        assert_eq!(message.sent_at.timestamp(), 1_690_000_000);
        assert_eq!(message.received_at.timestamp(), 1_690_000_060);
        assert_eq!(bob.store.messages(), vec![message]);
    }

    #[tokio::test]
    async fn test_rename_updates_existing_identity() {
        let bob = node();
        let alice = BoxKeyPair::generate();

        bob.service.receive(from(&alice, "Alice", "hi", &bob)).await.unwrap();
        let second = bob
            .service
            .receive(from(&alice, "Alice2", "new name", &bob))
            .await
            .unwrap();

        let identities = bob.store.identities();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].display_name, "Alice2");
        assert_eq!(second.from, "Alice2");

        // Earlier messages keep the name they arrived with.
        assert_eq!(bob.store.messages()[0].from, "Alice");
    }

    #[tokio::test]
    async fn test_payload_with_foreign_uid_when_binding_disabled() {
        let bob = node_with(IngestionConfig {
            enforce_sender_binding: false,
            ..IngestionConfig::default()
        });
        let relay = BoxKeyPair::generate();
        let uid = "aabbcc".repeat(10) + "aabb";
        let payload = json!({
            "message": {
                "body": "hi",
                "channel": "general",
                "thread": "t1",
                "contentType": "text"
            },
            "time_sent": 1_690_000_000,
            "sender": { "name": "Alice", "uid": uid }
        });

        let message = bob
            .service
            .receive(testing::envelope(&payload, &relay, &bob.keys.public_key))
            .await
            .unwrap();

        assert_eq!(message.sender_id.as_str(), uid);
        assert_eq!(bob.store.identities()[0].public_key[..3], [0xaa, 0xbb, 0xcc]);
    }

    // =============================================================================
    // REJECTION
    // =============================================================================

    #[tokio::test]
    async fn test_tampered_envelope_persists_nothing() {
        let bob = node();
        let alice = BoxKeyPair::generate();
        let envelope = testing::corrupt_tag(&from(&alice, "Alice", "hi", &bob));

        let err = bob.service.receive(envelope).await.unwrap_err();

        assert!(matches!(
            err,
            ImportError::Decrypt {
                source: DecryptError::Authentication,
                ..
            }
        ));
        assert!(bob.store.identities().is_empty());
        assert!(bob.store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_envelope_for_another_recipient_is_rejected() {
        let bob = node();
        let carol = node();
        let alice = BoxKeyPair::generate();

        let err = bob
            .service
            .receive(from(&alice, "Alice", "for carol", &carol))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ImportErrorKind::Authentication);
        assert!(bob.store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_envelope_claiming_other_sender_is_rejected() {
        let bob = node();
        let alice = BoxKeyPair::generate();
        let mallory = BoxKeyPair::generate();
        let forged = testing::envelope(
            &testing::payload(&alice, "Alice", "send coins"),
            &mallory,
            &bob.keys.public_key,
        );

        let err = bob.service.receive(forged).await.unwrap_err();

        assert!(matches!(err, ImportError::SenderMismatch { .. }));
        assert_eq!(err.stage(), ImportStage::SenderBinding);
        assert!(bob.store.identities().is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_plaintext() {
        let bob = node();
        let alice = BoxKeyPair::generate();
        let envelope = testing::sealed_envelope(
            &[0xc3, 0x28, 0xff],
            &alice,
            &bob.keys.public_key,
            BoxCipher::default(),
        );

        let err = bob.service.receive(envelope).await.unwrap_err();
        assert!(matches!(err, ImportError::Parse(ParseError::NotUtf8)));
    }

    #[tokio::test]
    async fn test_partial_payload_is_never_defaulted() {
        let bob = node();
        let alice = BoxKeyPair::generate();
        let payload = json!({
            "message": { "body": "hi", "channel": "general", "thread": "t1" },
            "time_sent": 1_690_000_000,
            "sender": { "name": "Alice", "uid": hex_of(&alice) }
        });

        let err = bob
            .service
            .receive(testing::envelope(&payload, &alice, &bob.keys.public_key))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImportError::Parse(ParseError::MissingField("message.contentType"))
        ));
        assert!(bob.store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_and_garbage_payloads() {
        let bob = node();
        let alice = BoxKeyPair::generate();
        let sender = hex_of(&alice);

        for payload in ["", "AAAA", "%%%not-base64%%%"] {
            let err = bob
                .service
                .receive(RawEnvelope::new(sender.clone(), payload))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ImportErrorKind::Decode, "payload {payload:?}");
        }
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_counters_track_outcomes() {
        register_metrics().unwrap();
        let bob = node();
        let alice = BoxKeyPair::generate();
        let received_before = ENVELOPES_RECEIVED.get();
        let decrypt_failures = IMPORT_FAILURES.with_label_values(&["decrypt"]);
        let failures_before = decrypt_failures.get();

        bob.service.receive(from(&alice, "Alice", "ok", &bob)).await.unwrap();
        let _ = bob
            .service
            .receive(testing::corrupt_tag(&from(&alice, "Alice", "bad", &bob)))
            .await;

        assert!(ENVELOPES_RECEIVED.get() >= received_before + 2.0);
        assert!(decrypt_failures.get() >= failures_before + 1.0);

        let text = gather_metrics().unwrap();
        assert!(text.contains("parley_ingestion_failures_total"));
        assert!(text.contains("parley_ingestion_receive_duration_seconds"));
    }

    fn hex_of(keys: &BoxKeyPair) -> String {
        IdentityId::from_public_key(&keys.public_key).to_string()
    }
}
