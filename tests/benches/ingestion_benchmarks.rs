//! # Parley Ingestion Benchmarks
//!
//! | Stage | Operation | Target |
//! |-------|-----------|--------|
//! | Decrypt | base64 + crypto-box open, 1 KiB | < 50µs |
//! | Parse | JSON payload to envelope | < 20µs |
//! | Receive | full pipeline, in-memory store | < 200µs |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pc_01_message_ingestion::testing;
use pc_01_message_ingestion::{
    decrypt, parse, InMemoryStore, MessageIngestionApi, MessageIngestionService,
    StaticKeyProvider,
};
use shared_crypto::{BoxCipher, BoxKeyPair};

fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-01-decrypt");
    group.measurement_time(Duration::from_secs(5));

    let sender = BoxKeyPair::generate();
    let recipient = BoxKeyPair::generate();

    for size in [64usize, 1024, 16 * 1024] {
        for cipher in [BoxCipher::XSalsa20Poly1305, BoxCipher::XChaCha20Poly1305] {
            let envelope =
                testing::sealed_envelope(&vec![b'x'; size], &sender, &recipient.public_key, cipher);

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{cipher:?}"), size),
                &envelope,
                |b, envelope| {
                    let decryptor =
                        pc_01_message_ingestion::Decryptor::new(cipher, usize::MAX);
                    b.iter(|| {
                        black_box(
                            decryptor
                                .decrypt(
                                    &envelope.payload,
                                    &sender.public_key,
                                    recipient.secret_key.as_bytes(),
                                )
                                .is_ok(),
                        )
                    })
                },
            );
        }
    }

    // Default-cipher free function, as used by callers without a service
    let envelope = testing::sealed_envelope(
        b"ping",
        &sender,
        &recipient.public_key,
        BoxCipher::default(),
    );
    group.bench_function("decrypt_fn_small", |b| {
        b.iter(|| {
            black_box(decrypt(
                &envelope.payload,
                &sender.public_key,
                recipient.secret_key.as_bytes(),
            ))
        })
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let sender = BoxKeyPair::generate();
    let plaintext = testing::payload(&sender, "Alice", "hello there").to_string();

    c.bench_function("pc-01-parse", |b| {
        b.iter(|| black_box(parse(plaintext.as_bytes()).is_ok()))
    });
}

fn bench_receive(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let local = BoxKeyPair::generate();
    let alice = BoxKeyPair::generate();
    let store = Arc::new(InMemoryStore::new());
    let service = MessageIngestionService::new(
        store.clone(),
        store,
        Arc::new(StaticKeyProvider::from_secret(&local.secret_key)),
    );
    let envelope = testing::envelope(
        &testing::payload(&alice, "Alice", "benchmark"),
        &alice,
        &local.public_key,
    );

    c.bench_function("pc-01-receive", |b| {
        b.iter(|| {
            runtime.block_on(async {
                black_box(service.receive(envelope.clone()).await.is_ok())
            })
        })
    });
}

criterion_group!(benches, bench_decrypt, bench_parse, bench_receive);
criterion_main!(benches);
