use assay_codec::Catalog;
use assay_core::{AssignmentLedger, Credentials, LoginRequest, ResourceRegistry, SharedSecret};
use assay_dsa::GroupAllocator;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn allocator_select(c: &mut Criterion) {
    let labels: Vec<String> = ["Al", "Cu", "Fe", "Mg", "Sn", "Zn"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut alloc = GroupAllocator::new();
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("group_allocator_select", |b| {
        b.iter(|| alloc.select(black_box("3"), &labels, &mut rng))
    });
}

fn ledger_login(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let catalog: Catalog = serde_json::from_value(serde_json::json!({ "Zn": {}, "Cu": {} })).unwrap();
    let ledger = AssignmentLedger::open(
        dir.path(),
        ResourceRegistry::from_catalog(catalog).unwrap(),
        Credentials::new(SharedSecret::new("pw"), SharedSecret::new("pw")),
        Box::new(StdRng::seed_from_u64(2)),
    )
    .unwrap();

    let mut next = 10_000_000u32;
    c.bench_function("ledger_login_durable", |b| {
        b.iter(|| {
            next += 1;
            let request = LoginRequest {
                full_name: "Bench".into(),
                id950: next.to_string(),
                period: "1".into(),
                password: "pw".into(),
            };
            ledger.login(black_box(&request)).unwrap()
        })
    });
}

criterion_group!(benches, allocator_select, ledger_login);
criterion_main!(benches);
