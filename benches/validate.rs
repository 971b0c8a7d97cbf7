use barcode_gate::{DedupFilter, TrustPolicy, validate, validate_batch, validate_batch_with};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const MIXED: [&str; 8] = [
    "4006381333931",
    "036000291452",
    "4006381333932",
    "12345678",
    "ABC-123/45",
    "1234",
    "bad read 1",
    "9780201379624",
];

fn mixed_batch(len: usize) -> Vec<String> {
    MIXED.iter().cycle().take(len).map(|s| s.to_string()).collect()
}

fn bench_validate_ean13(c: &mut Criterion) {
    c.bench_function("validate_ean13", |b| b.iter(|| validate(black_box("4006381333931"))));
}

fn bench_validate_upca(c: &mut Criterion) {
    c.bench_function("validate_upca", |b| b.iter(|| validate(black_box("036000291452"))));
}

fn bench_validate_rejected(c: &mut Criterion) {
    c.bench_function("validate_unrecognized", |b| b.iter(|| validate(black_box("bad read 1"))));
}

fn bench_validate_mixed_sequential(c: &mut Criterion) {
    let batch = mixed_batch(10_000);
    c.bench_function("validate_mixed_10k_sequential", |b| {
        b.iter(|| batch.iter().map(|p| validate(black_box(p))).count())
    });
}

fn bench_validate_batch_parallel(c: &mut Criterion) {
    let batch = mixed_batch(10_000);
    c.bench_function("validate_batch_10k_parallel", |b| b.iter(|| validate_batch(black_box(&batch))));
    c.bench_function("validate_batch_10k_parallel_checksummed", |b| {
        b.iter(|| validate_batch_with(black_box(&batch), TrustPolicy::Checksummed))
    });
}

fn bench_dedup_stream(c: &mut Criterion) {
    let batch = mixed_batch(10_000);
    c.bench_function("dedup_10k", |b| {
        b.iter(|| {
            let mut filter = DedupFilter::new();
            batch.iter().filter(|p| filter.should_accept(black_box(p))).count()
        })
    });
}

criterion_group!(
    benches,
    bench_validate_ean13,
    bench_validate_upca,
    bench_validate_rejected,
    bench_validate_mixed_sequential,
    bench_validate_batch_parallel,
    bench_dedup_stream
);
criterion_main!(benches);
