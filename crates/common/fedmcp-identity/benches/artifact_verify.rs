use criterion::{criterion_group, criterion_main, Criterion};
use fedmcp_identity::{ArtifactSigner, ArtifactVerifier, KeyMaterial, LocalSigner};
use fedmcp_types::Artifact;
use std::sync::Arc;

fn bench_artifact_verify(c: &mut Criterion) {
    let key = Arc::new(KeyMaterial::generate());
    let signer = LocalSigner::new(key.clone());
    let trusted = key.trusted_key();

    let steps: Vec<String> = (0..64).map(|i| format!("step-{i}")).collect();
    let artifact = Artifact::new(
        "agent_recipe",
        "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        serde_json::json!({ "name": "Benchmark Recipe", "steps": steps }),
    )
    .unwrap();
    let token = signer.sign(&artifact).unwrap();
    let verifier = ArtifactVerifier::new();

    c.bench_function("artifact_sign", |b| {
        b.iter(|| signer.sign(&artifact).unwrap());
    });
    c.bench_function("artifact_verify", |b| {
        b.iter(|| assert!(verifier.verify(&artifact, token.as_str(), &trusted).is_valid()));
    });
}

criterion_group!(benches, bench_artifact_verify);
criterion_main!(benches);
