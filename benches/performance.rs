//! Performance benchmarks for the feed.

use blogcast::{
    BlogService, RecordInput, RecordStore, ServiceConfig, SubscriptionConfig, TopicBus,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark writes with varying numbers of live sessions
fn bench_add_with_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_new_blog");

    for subscribers in [0, 1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &count| {
                let service = BlogService::new(ServiceConfig {
                    subscription: SubscriptionConfig {
                        buffer_size: 1 << 16,
                    },
                    ..Default::default()
                });

                // Sinks that accept and discard
                for _ in 0..count {
                    service
                        .new_blog(|record: &blogcast::Record| -> blogcast::Result<()> {
                            black_box(record);
                            Ok(())
                        })
                        .unwrap();
                }

                b.iter(|| {
                    black_box(service.add_new_blog("benchmark content", "bench").unwrap());
                });

                service.shutdown();
            },
        );
    }

    group.finish();
}

/// Benchmark raw fan-out on the bus
fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");

    for subscribers in [1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &count| {
                let bus: TopicBus<u64> =
                    TopicBus::with_config(SubscriptionConfig { buffer_size: 64 });
                let subs: Vec<_> = (0..count).map(|_| bus.subscribe("bench").unwrap()).collect();

                let mut n = 0u64;
                b.iter(|| {
                    black_box(bus.publish("bench", n));
                    n += 1;
                    // Keep buffers from overflowing
                    for sub in &subs {
                        while sub.try_recv().is_ok() {}
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark snapshot reads with varying store sizes
fn bench_list_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_all");

    for size in [100, 1000, 10000] {
        let store = RecordStore::new();
        for i in 0..size {
            store
                .append(RecordInput::new(format!("post {}", i), "author"))
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::new("records", size), &size, |b, _| {
            b.iter(|| black_box(store.list_all()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add_with_subscribers,
    bench_publish_fan_out,
    bench_list_all
);
criterion_main!(benches);
