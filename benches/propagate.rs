//! Benchmarks for single-object SGP4/SDP4 propagation.
//!
//!   cargo bench --bench propagate
//!   cargo bench --bench propagate -- propagate/deep_space

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hifitime::Unit;

use skypass::elements::OrbitalElements;
use skypass::PropagationModel;

const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   24061.52543534  .00018023  00000-0  32313-3 0  9993
2 25544  51.6410 118.9424 0005630 321.6407 183.4990 15.49942322441784";

const GEO: &str = "1 26038U 00007A   24061.50000000 -.00000278  00000-0  00000+0 0  9991
2 26038   0.0154 129.5265 0002412 234.5236 311.7238  1.00271759 88277";

const MOLNIYA: &str = "1 21897U 92011A   24061.50000000  .00000080  00000-0  00000+0 0  9995
2 21897  62.8523 254.3866 7126345 281.6712  14.6732  2.00611126235219";

fn bench_decode(c: &mut Criterion) {
    c.bench_function("decode/tle_with_coefficients", |b| {
        b.iter(|| OrbitalElements::from_tle_text(black_box(ISS), PropagationModel::default()))
    });
}

fn bench_near_earth(c: &mut Criterion) {
    let el = OrbitalElements::from_tle_text(ISS, PropagationModel::default()).unwrap();
    c.bench_function("propagate/near_earth", |b| {
        b.iter(|| el.propagate_minutes(black_box(137.0)))
    });

    let at = el.epoch() + Unit::Hour * 6.0;
    c.bench_function("propagate/near_earth_epoch", |b| b.iter(|| el.propagate(black_box(&at))));
}

/// Deep-space cost grows with the distance to epoch for resonant orbits.
fn bench_deep_space(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate/deep_space");
    for (label, text) in [("geo", GEO), ("molniya", MOLNIYA)] {
        let el = OrbitalElements::from_tle_text(text, PropagationModel::default()).unwrap();
        for days in [0.0, 7.0, 30.0] {
            group.bench_with_input(
                BenchmarkId::new(label, format!("{days}d")),
                &(days * 1440.0),
                |b, t| b.iter(|| el.propagate_minutes(black_box(*t))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_near_earth, bench_deep_space);
criterion_main!(benches);
