// Pool throughput benchmarks.
//
// Measures raw pool acquire/release overhead with a zero-cost resource
// (no I/O, instant create/destroy).

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use tidepool::{Factory, Pool, PoolConfig, Result};

// -- Minimal no-op factory for benchmarking pool overhead only --

struct NoOpFactory;

impl Factory for NoOpFactory {
    type Resource = u64;

    async fn create(&self) -> Result<u64> {
        Ok(0)
    }

    async fn destroy(&self, _resource: u64) -> Result<()> {
        Ok(())
    }
}

fn pool_config(max: usize) -> PoolConfig {
    PoolConfig {
        max,
        acquire_timeout: Some(Duration::from_secs(5)),
        eviction_run_interval: Duration::ZERO,
        ..Default::default()
    }
}

fn single_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");

    let pool = Pool::new(NoOpFactory, pool_config(64));

    // Warm up: acquire and return one resource so subsequent acquires reuse it.
    rt.block_on(async {
        let handle = pool.acquire().await.unwrap();
        pool.release(handle).await.unwrap();
    });

    c.bench_function("single_thread_acquire_release", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let handle = pool.acquire().await.unwrap();
                pool.release(handle).await.unwrap();
                black_box(())
            }
        });
    });
}

fn multi_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");

    let pool = Pool::new(NoOpFactory, pool_config(64));

    // Warm up pool with some resources.
    rt.block_on(async {
        let mut handles = Vec::new();
        for _ in 0..8 {
            handles.push(pool.acquire().await.unwrap());
        }
        for handle in handles {
            pool.release(handle).await.unwrap();
        }
    });

    c.bench_function("multi_thread_acquire_release", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let handle = pool.acquire().await.unwrap();
                pool.release(handle).await.unwrap();
                black_box(())
            }
        });
    });
}

fn concurrent_contention(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");

    // Small pool to create contention.
    let pool = Pool::new(NoOpFactory, pool_config(4));

    c.bench_function("contended_acquire_release_4slots", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let handle = pool.acquire().await.unwrap();
                pool.release(handle).await.unwrap();
                black_box(())
            }
        });
    });
}

criterion_group!(
    benches,
    single_thread_throughput,
    multi_thread_throughput,
    concurrent_contention,
);
criterion_main!(benches);
