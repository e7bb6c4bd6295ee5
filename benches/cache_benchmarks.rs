//! Cache benchmarks for tagcache

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use tagcache::prelude::*;

fn cache_set_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = Arc::new(TagCache::new(MemoryStore::new()));

    let mut group = c.benchmark_group("tagcache_set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_permanent", |b| {
        b.to_async(&rt).iter(|| async {
            cache
                .set("bench.key", "benchmark_value", Ttl::Permanent)
                .await
                .unwrap();
        });
    });

    group.bench_function("set_temporary", |b| {
        b.to_async(&rt).iter(|| async {
            cache
                .set("bench.key", "benchmark_value", Ttl::Temporary)
                .await
                .unwrap();
        });
    });

    group.finish();
}

fn cache_get_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = Arc::new(TagCache::new(MemoryStore::new()));

    // Pre-populate cache
    rt.block_on(async {
        cache
            .set("bench.existing", "existing_value", Ttl::Permanent)
            .await
            .unwrap();
    });

    let mut group = c.benchmark_group("tagcache_get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_hit", |b| {
        b.to_async(&rt).iter(|| async {
            let result: Option<String> = cache.get("bench.existing").await.unwrap();
            black_box(result)
        });
    });

    group.bench_function("get_miss", |b| {
        b.to_async(&rt).iter(|| async {
            let result: Option<String> = cache.get("bench.missing").await.unwrap();
            black_box(result)
        });
    });

    group.finish();
}

fn tag_invalidation_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("tagcache_delete_tag");

    for size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let cache = TagCache::new(MemoryStore::new());
                cache
                    .set_multiple(
                        (0..size).map(|i| (format!("tag.{}", i), i)),
                        Ttl::Permanent,
                    )
                    .await
                    .unwrap();
                black_box(cache.delete("tag.").await.unwrap())
            });
        });
    }

    group.finish();
}

fn counter_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = Arc::new(TagCache::new(MemoryStore::new()));

    c.bench_function("tagcache_increment", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(cache.increment("stats.hits", 1).await.unwrap())
        });
    });
}

fn key_decode_benchmark(c: &mut Criterion) {
    c.bench_function("key_decode", |b| {
        b.iter(|| black_box(KeyCodec::decode(black_box("article.123.comments"))));
    });
}

criterion_group!(
    benches,
    cache_set_benchmark,
    cache_get_benchmark,
    tag_invalidation_benchmark,
    counter_benchmark,
    key_decode_benchmark,
);
criterion_main!(benches);
