use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use op_cache::{HashMapStore, MokaStore, MokaStoreConfig, OpCache, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

mod common;
use common::{BenchConfig, BenchUser, FakeDatabase, KeyGenerator, NotFound};

type UserCache = OpCache<BenchUser, NotFound>;

/// Cache backed by the default HashMapStore
fn setup_hashmap(config: &BenchConfig) -> UserCache {
    let store: Arc<dyn Store<BenchUser, NotFound>> = Arc::new(HashMapStore::default());
    OpCache::with_store(config.cache_config(), store)
}

/// Cache backed by a bounded MokaStore
fn setup_moka(config: &BenchConfig) -> UserCache {
    let store: Arc<dyn Store<BenchUser, NotFound>> =
        Arc::new(MokaStore::new(MokaStoreConfig {
            max_capacity: 10_000,
        }));
    OpCache::with_store(config.cache_config(), store)
}

async fn load(cache: &UserCache, db: &FakeDatabase, key: &str) -> Result<BenchUser, NotFound> {
    let db = db.clone();
    let owned = key.to_string();
    cache
        .get(key, move || async move { db.get(&owned).await })
        .await
}

async fn load_all(cache: &UserCache, db: &FakeDatabase, keys: &[String]) {
    for key in keys {
        let _ = black_box(load(cache, db, key).await);
    }
}

/// Benchmark 1: Hot Cache (all hits, pure cache read performance)
fn bench_hot_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hot_cache");
    group.sample_size(config.sample_size);

    let db = FakeDatabase::new(10000, config.db_latency_ms);
    let keys = KeyGenerator::new(10000).sequential();
    group.throughput(Throughput::Elements(keys.len() as u64));

    for (name, setup) in [
        ("hashmap", setup_hashmap as fn(&BenchConfig) -> UserCache),
        ("moka", setup_moka as fn(&BenchConfig) -> UserCache),
    ] {
        group.bench_with_input(BenchmarkId::new(name, keys.len()), &keys, |b, keys| {
            let cache = setup(config);

            // Pre-populate cache
            rt.block_on(load_all(&cache, &db, keys));

            b.to_async(&rt).iter(|| load_all(&cache, &db, keys));
        });
    }

    group.finish();
}

/// Benchmark 2: Cold Cache (every lookup runs the operation)
fn bench_cold_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cold_cache");
    group.sample_size(config.sample_size.min(20)); // Fewer samples due to origin latency
    group.measurement_time(Duration::from_secs(30));

    let db = FakeDatabase::new(100, config.db_latency_ms);
    let keys = KeyGenerator::new(100).sequential();
    group.throughput(Throughput::Elements(keys.len() as u64));

    group.bench_function("hashmap", |b| {
        b.to_async(&rt).iter(|| {
            let cache = setup_hashmap(config);
            let db = db.clone();
            let keys = keys.clone();
            async move { load_all(&cache, &db, &keys).await }
        });
    });

    group.bench_function("moka", |b| {
        b.to_async(&rt).iter(|| {
            let cache = setup_moka(config);
            let db = db.clone();
            let keys = keys.clone();
            async move { load_all(&cache, &db, &keys).await }
        });
    });

    group.finish();
}

/// Benchmark 3: Mixed Workload (80% hits on a hot key range)
fn bench_mixed_workload(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("mixed_workload");
    group.sample_size(config.sample_size.min(50));

    let db = FakeDatabase::new(1000, config.db_latency_ms);
    let generator = KeyGenerator::new(1000);
    let hot_keys: Vec<String> = generator.sequential().into_iter().take(800).collect();
    let workload = generator.mixed(0.8);
    group.throughput(Throughput::Elements(workload.len() as u64));

    for (name, setup) in [
        ("hashmap", setup_hashmap as fn(&BenchConfig) -> UserCache),
        ("moka", setup_moka as fn(&BenchConfig) -> UserCache),
    ] {
        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| {
                let cache = setup(config);
                let db = db.clone();
                let hot_keys = hot_keys.clone();
                let workload = workload.clone();
                async move {
                    load_all(&cache, &db, &hot_keys).await;
                    load_all(&cache, &db, &workload).await;
                }
            });
        });
    }

    group.finish();
    eprintln!("mixed_workload origin queries: {}", db.query_count());
}

/// Benchmark 4: Batched lookups through multi_get
fn bench_multi_get(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("multi_get");
    group.sample_size(config.sample_size.min(50));

    let db = FakeDatabase::new(1000, config.db_latency_ms);
    let keys = KeyGenerator::new(1000).sequential();

    for batch_size in [10, 100, 1000] {
        let batch: Vec<String> = keys.iter().take(batch_size).cloned().collect();
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(
            BenchmarkId::new("cold", batch_size),
            &batch,
            |b, batch| {
                b.to_async(&rt).iter(|| {
                    let cache = setup_hashmap(config);
                    let db = db.clone();
                    let batch = batch.clone();
                    async move {
                        let lookup = Arc::new(batch.clone());
                        let results = cache
                            .multi_get(&batch, move |indices: Vec<usize>| {
                                let db = db.clone();
                                let wanted: Vec<String> =
                                    indices.iter().map(|&i| lookup[i].clone()).collect();
                                async move { db.get_many(&wanted).await }
                            })
                            .await;
                        black_box(results)
                    }
                });
            },
        );
    }

    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let config = BenchConfig::from_env();

    bench_hot_cache(c, &config);
    bench_cold_cache(c, &config);
    bench_mixed_workload(c, &config);
    bench_multi_get(c, &config);
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
