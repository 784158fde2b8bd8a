//! Benchmarks for the batch sky view.
//!
//!   cargo bench --bench sky_batch
//!   RAYON_NUM_THREADS=1 cargo bench --bench sky_batch

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hifitime::Epoch;

use skypass::observers::Observer;
use skypass::{ElementRecord, SkyParams, SkyPass};

/// Walker-like shell of GP records spread over 24 planes.
fn shell(size: usize) -> Vec<ElementRecord> {
    (0..size)
        .map(|i| {
            let plane = i % 24;
            let slot = i / 24;
            let json = serde_json::json!({
                "OBJECT_NAME": format!("STARLINK-{}", 1000 + i),
                "EPOCH": "2024-03-01T06:00:00",
                "MEAN_MOTION": 15.06,
                "ECCENTRICITY": 0.0001 + 1e-6 * slot as f64,
                "INCLINATION": 53.05,
                "RA_OF_ASC_NODE": 15.0 * plane as f64,
                "ARG_OF_PERICENTER": 90.0,
                "MEAN_ANOMALY": (slot as f64 * 17.3) % 360.0,
                "NORAD_CAT_ID": 44000 + i,
                "BSTAR": 2.0e-4,
            });
            ElementRecord::from_omm(serde_json::from_value(json).unwrap())
        })
        .collect()
}

fn bench_batch(c: &mut Criterion) {
    let observer = Observer::new(45.0, 5.0, 300.0).unwrap();
    let time = Epoch::from_gregorian_utc(2024, 3, 1, 12, 0, 0, 0);
    let parallel = SkyPass::default();
    let sequential = SkyPass::new(SkyParams::builder().parallel(false).build().unwrap());

    let mut group = c.benchmark_group("sky_batch");
    for size in [100usize, 1_000, 5_000] {
        let catalog = shell(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("parallel", size), &catalog, |b, cat| {
            b.iter(|| parallel.compute_visible(&observer, time, cat))
        });
        group.bench_with_input(BenchmarkId::new("sequential", size), &catalog, |b, cat| {
            b.iter(|| sequential.compute_visible(&observer, time, cat))
        });

        let prepared = parallel.prepare(&catalog);
        group.bench_with_input(BenchmarkId::new("prepared", size), &prepared, |b, cat| {
            b.iter(|| parallel.visible_from_prepared(&observer, time, cat))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch);
criterion_main!(benches);
