use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use khronos::resp::codec::{self, FrameLimits, Request};
use khronos::RoutedQueue;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Benchmark: Enqueue with mixed priorities
fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");

    for priorities in [1i64, 16, 1024].iter() {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(priorities),
            priorities,
            |b, &priorities| {
                let value = Bytes::from_static(b"{\"test\":\"data\",\"id\":123}");

                b.iter(|| {
                    let queue = RoutedQueue::new();
                    for i in 0..1000i64 {
                        queue.enqueue("bench", black_box(value.clone()), i % priorities);
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark: Fill then drain one route
fn bench_enqueue_then_dequeue(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("enqueue_then_dequeue");

    for size in [1000usize, 10000, 100000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let token = CancellationToken::new();
                let queue = RoutedQueue::new();
                for i in 0..size {
                    queue.enqueue("bench", Bytes::from_static(b"data"), (i % 7) as i64);
                }
                for _ in 0..size {
                    let _ = black_box(queue.dequeue("bench", &token).await);
                }
            });
        });
    }
    group.finish();
}

/// Benchmark: Consumers blocked before producers start, so every item is a
/// direct hand-off
fn bench_blocked_handoff(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("blocked_handoff");
    group.sample_size(50);

    for consumers in [1usize, 4, 16].iter() {
        group.throughput(Throughput::Elements((*consumers * 1000) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(consumers),
            consumers,
            |b, &consumers| {
                b.to_async(&rt).iter(|| async move {
                    let queue = Arc::new(RoutedQueue::new());

                    let mut handles = vec![];
                    for _ in 0..consumers {
                        let queue = queue.clone();
                        handles.push(tokio::spawn(async move {
                            let token = CancellationToken::new();
                            for _ in 0..1000 {
                                let _ = black_box(queue.dequeue("bench", &token).await);
                            }
                        }));
                    }

                    let producer = {
                        let queue = queue.clone();
                        tokio::spawn(async move {
                            for _ in 0..consumers * 1000 {
                                queue.enqueue("bench", Bytes::from_static(b"data"), 0);
                                tokio::task::yield_now().await;
                            }
                        })
                    };

                    producer.await.unwrap();
                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark: Concurrent producers across routes
fn bench_concurrent_producers(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("concurrent_producers");

    for producers in [2usize, 4, 8, 16].iter() {
        group.throughput(Throughput::Elements((*producers * 1000) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(producers),
            producers,
            |b, &producers| {
                b.to_async(&rt).iter(|| async move {
                    let queue = Arc::new(RoutedQueue::new());

                    let mut handles = vec![];
                    for p in 0..producers {
                        let queue = queue.clone();
                        handles.push(tokio::spawn(async move {
                            let route = format!("route-{}", p % 4);
                            for i in 0..1000i64 {
                                queue.enqueue(&route, Bytes::from_static(b"data"), i);
                            }
                        }));
                    }

                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark: Request decoding by value size
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let limits = FrameLimits::default();

    for size in [16usize, 1024, 65536].iter() {
        let mut frame = BytesMut::new();
        Request::new("push", ["bench", "x".repeat(*size).as_str(), "5"].map(String::from)).encode(&mut frame);

        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| {
                let mut src = frame.clone();
                black_box(codec::decode(&mut src, &limits).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue,
    bench_enqueue_then_dequeue,
    bench_blocked_handoff,
    bench_concurrent_producers,
    bench_decode,
);

criterion_main!(benches);
