//! Benchmarks for the priority thread pool.
//!
//! Benchmarks cover:
//! - Submit + get round trips on both levels
//! - Synchronous fallback overhead
//! - Cancellation of queued tasks
//! - Parallel-for over varying index counts

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use prometheus_thread_pool::config::ThreadPoolConfig;
use prometheus_thread_pool::core::{Task, TaskPriority, ThreadPool};

fn make_pool(normal: usize, low: usize) -> ThreadPool {
    ThreadPool::new(
        ThreadPoolConfig::new()
            .with_thread_count(normal)
            .with_low_priority_thread_count(low),
    )
    .unwrap()
}

// ============================================================================
// Submit / Get
// ============================================================================

fn bench_submit_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_get");
    let pool = make_pool(4, 2);

    for batch in [1_u64, 16, 256] {
        group.throughput(Throughput::Elements(batch));
        for priority in TaskPriority::ALL {
            group.bench_with_input(
                BenchmarkId::new(priority.as_str(), batch),
                &batch,
                |b, &batch| {
                    b.iter(|| {
                        let mut tasks: Vec<Task<u64>> = (0..batch)
                            .map(|i| pool.submit(priority, move || black_box(i) * 2))
                            .collect();
                        let sum: u64 = tasks.iter_mut().map(|t| t.get().unwrap()).sum();
                        black_box(sum)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_synchronous_fallback(c: &mut Criterion) {
    let pool = ThreadPool::new(ThreadPoolConfig::synchronous()).unwrap();

    c.bench_function("synchronous_submit_get", |b| {
        b.iter(|| {
            let mut task = pool.spawn(|| black_box(7_u64));
            black_box(task.get().unwrap())
        });
    });
}

fn bench_cancel_queued(c: &mut Criterion) {
    let pool = make_pool(1, 1);

    c.bench_function("submit_then_drop", |b| {
        b.iter(|| {
            let task = pool.submit(TaskPriority::Low, || black_box(1_u64));
            drop(task);
        });
    });
}

// ============================================================================
// Parallel-for
// ============================================================================

fn bench_submit_indexed(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_indexed");
    let pool = make_pool(num_cpus::get().max(2) - 1, 1);
    let sink = Arc::new(AtomicU64::new(0));

    for size in [64_usize, 4_096, 262_144] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let sink = Arc::clone(&sink);
                pool.submit_indexed(TaskPriority::Normal, size, move |i| {
                    sink.fetch_add(black_box(i as u64) & 1, Ordering::Relaxed);
                })
                .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    task_benches,
    bench_submit_get,
    bench_synchronous_fallback,
    bench_cancel_queued
);

criterion_group!(parallel_benches, bench_submit_indexed);

criterion_main!(task_benches, parallel_benches);
