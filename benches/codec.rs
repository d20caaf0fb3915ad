//! This bench test encodes a large register to CSV and imports it again.

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use iar::{storage, CandidateFields, Field, Register};

/// Builds a register of shared mobile assets, so every column is filled.
fn preseed_register(count: usize) -> Register {
    let mut register = Register::new();
    for i in 1..=count {
        let candidate = CandidateFields::new()
            .with(Field::AssetName, format!("Asset {i}"))
            .with(Field::Owner, "Records, \"Legal\" team")
            .with(Field::Purpose, "Line one\nline two")
            .with(Field::Location, "Cloud Storage")
            .with(Field::SpecialCategoryData, "No")
            .with(Field::SharedExternally, "Yes - Both")
            .with(Field::RopaStatus, "Under Review")
            .with(Field::IsMobileDevice, "Yes")
            .with(Field::DateIssued, "2024-01-15")
            .with(Field::LastAuditDate, "2024-06-01")
            .with(Field::BreachSinceAudit, "Yes")
            .with(Field::BreachActionsStatus, "In Progress");
        register.append(&candidate).unwrap();
    }
    register
}

fn encode(c: &mut Criterion) {
    let register = preseed_register(1000);
    c.bench_function("encode 1000 assets", |b| {
        b.iter(|| storage::encode(register.snapshot()));
    });
}

fn import(c: &mut Criterion) {
    let text = storage::encode(preseed_register(1000).snapshot());
    c.bench_function("import 1000 assets", |b| {
        b.iter_batched(
            || text.clone(),
            |text| {
                let rows = storage::decode(&text).unwrap();
                let mut register = Register::new();
                let report = register.bulk_load(rows);
                assert!(report.is_clean());
                register
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, encode, import);
criterion_main!(benches);
