//! Benchmark for mint signature issuance.
//!
//! TARGET: well under 1ms per request on one core
//!
//! Run with: cargo bench --package reflex_signer --bench signing_benchmark

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reflex_blockchain::{MintAuthorization, MintDomain};
use reflex_shared::SystemClock;
use reflex_signer::{MintSigner, SignatureService, SignerConfig};

fn domain() -> MintDomain {
    MintDomain {
        name: "ReflexBlitz Achievement NFT".into(),
        version: "1".into(),
        chain_id: 10_143,
        verifying_contract: Address::repeat_byte(0x22),
    }
}

fn benchmark_digest(c: &mut Criterion) {
    let domain = domain();
    let message = MintAuthorization {
        player: Address::repeat_byte(0x11),
        score: U256::from(50_000u64),
        nonce: U256::from(1_700_000_000_000u64),
        expiry: U256::from(1_700_003_600u64),
        contract: Address::repeat_byte(0x22),
    };

    c.bench_function("eip712_signing_hash", |b| {
        b.iter(|| black_box(black_box(&message).signing_hash(black_box(&domain))));
    });
}

fn benchmark_sign(c: &mut Criterion) {
    let signer = MintSigner::from_bytes(&[7u8; 32]).unwrap();
    let domain = domain();

    let mut group = c.benchmark_group("signing");
    group.throughput(Throughput::Elements(1));
    group.bench_function("sign_mint_authorization", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            nonce += 1;
            let message = MintAuthorization {
                player: Address::repeat_byte(0x11),
                score: U256::from(50_000u64),
                nonce: U256::from(nonce),
                expiry: U256::from(1_700_003_600u64),
                contract: Address::repeat_byte(0x22),
            };
            black_box(signer.sign(&message, &domain).unwrap())
        });
    });
    group.finish();
}

fn benchmark_full_request(c: &mut Criterion) {
    let config = SignerConfig {
        signer_private_key: Some(format!("0x{}", "07".repeat(32))),
        nft_contract_address: Some("0x2222222222222222222222222222222222222222".into()),
        ..SignerConfig::default()
    };
    let service = SignatureService::new(&config, Arc::new(SystemClock));
    let body = br#"{"playerAddress":"0x1111111111111111111111111111111111111111","score":50000,"fid":42}"#;

    c.bench_function("handle_request", |b| {
        b.iter(|| black_box(service.handle(black_box(body))));
    });
}

criterion_group!(benches, benchmark_digest, benchmark_sign, benchmark_full_request);
criterion_main!(benches);
