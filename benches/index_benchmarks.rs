use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::Point;
use std::sync::Arc;
use store_locator::compute::{distance, quadhash};
use store_locator::{IngestConfig, MemorySource, SpatialIndex, StoreRecord, start_ingestion};

fn hong_kong_store(id: u32) -> StoreRecord {
    let lat = 22.25 + ((id % 1000) as f64 * 0.0001);
    let lon = 114.15 + ((id / 1000) as f64 * 0.0001);
    StoreRecord::new(id, "store", "Hong Kong", "CN", lat, lon)
}

fn benchmark_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");

    for precision in [4, 8, 12] {
        group.bench_with_input(
            BenchmarkId::new("encode", precision),
            &precision,
            |b, &precision| {
                b.iter(|| quadhash::encode(black_box(22.3407), black_box(114.2017), precision).unwrap())
            },
        );
    }

    group.bench_function("decode", |b| {
        b.iter(|| quadhash::decode(black_box("cbacdddcabcd")).unwrap())
    });

    group.bench_function("vincenty", |b| {
        let from = Point::new(114.20, 22.34);
        let to = Point::new(114.21343994140625, 22.3228702545166);
        b.iter(|| distance::vincenty_distance(black_box(&from), black_box(&to), 200).unwrap())
    });

    group.finish();
}

fn benchmark_index_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_operations");

    group.bench_function("insert", |b| {
        let index = SpatialIndex::default();
        let mut counter = 0u32;
        b.iter(|| {
            index.insert(black_box(hong_kong_store(counter))).unwrap();
            counter = counter.wrapping_add(1);
        })
    });

    for size in [100u32, 1_000, 10_000] {
        let index = SpatialIndex::default();
        for id in 0..size {
            index.insert(hong_kong_store(id)).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("query_radius", size), &index, |b, index| {
            b.iter(|| {
                store_locator::query_radius(
                    index,
                    black_box(22.30),
                    black_box(114.16),
                    black_box(2.0),
                    200,
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");
    group.sample_size(10);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let document = {
        let records: Vec<String> = (0..10_000u32)
            .map(|id| serde_json::to_string(&hong_kong_store(id)).unwrap())
            .collect();
        format!("[{}]", records.join(","))
    };
    let source = Arc::new(MemorySource::new().with_document("stores.json", document));

    for capacity in [2, 64, 1024] {
        let config = IngestConfig {
            channel_capacity: capacity,
            ..IngestConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("pipeline_10k", capacity),
            &config,
            |b, config| {
                b.iter(|| {
                    let index = Arc::new(SpatialIndex::default());
                    runtime
                        .block_on(async {
                            start_ingestion(index, source.clone(), "stores.json", config)
                                .wait()
                                .await
                        })
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_hashing,
    benchmark_index_operations,
    benchmark_ingestion
);

criterion_main!(benches);
