//! Drain and clear shutdown protocols.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tidepool::{Error, Factory, Pool, PoolConfig, Result};

#[derive(Clone)]
struct CountingFactory {
    created: Arc<AtomicU32>,
    destroyed: Arc<AtomicU32>,
}

impl CountingFactory {
    fn new() -> Self {
        Self {
            created: Arc::new(AtomicU32::new(0)),
            destroyed: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Factory for CountingFactory {
    type Resource = u32;

    async fn create(&self) -> Result<u32> {
        Ok(self.created.fetch_add(1, Ordering::SeqCst))
    }

    async fn destroy(&self, _resource: u32) -> Result<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// drain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn drain_waits_for_outstanding_loans() {
    let pool = Pool::new(CountingFactory::new(), PoolConfig::default());
    let held = pool.acquire().await.unwrap();

    let drain_pool = pool.clone();
    let drain = tokio::spawn(async move { drain_pool.drain().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pool.is_draining());
    assert!(!drain.is_finished(), "drain must wait for the loan");

    pool.release(held).await.unwrap();
    drain.await.unwrap();
}

#[tokio::test]
async fn drain_waits_for_queued_waiters_to_be_served() {
    let pool = Pool::new(CountingFactory::new(), PoolConfig::default());
    let held = pool.acquire().await.unwrap();

    let waiter_pool = pool.clone();
    let waiter = tokio::spawn(async move {
        let handle = waiter_pool.acquire().await.unwrap();
        waiter_pool.release(handle).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.pending(), 1);

    let drain_pool = pool.clone();
    let drain = tokio::spawn(async move { drain_pool.drain().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!drain.is_finished(), "a queued waiter is still unsettled");

    // The waiter enqueued before drain is served by the returned resource.
    pool.release(held).await.unwrap();
    waiter.await.unwrap();
    drain.await.unwrap();
}

#[tokio::test]
async fn drain_then_acquire_is_rejected() {
    let pool = Pool::new(CountingFactory::new(), PoolConfig::default());
    pool.drain().await;
    assert!(matches!(pool.acquire().await.unwrap_err(), Error::Draining));
}

#[tokio::test]
async fn destroyed_loan_also_unblocks_drain() {
    let pool = Pool::new(CountingFactory::new(), PoolConfig::default());
    let held = pool.acquire().await.unwrap();

    let drain_pool = pool.clone();
    let drain = tokio::spawn(async move { drain_pool.drain().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!drain.is_finished());

    pool.destroy(held).await.unwrap();
    drain.await.unwrap();
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_destroys_every_idle_resource() {
    let factory = CountingFactory::new();
    let pool = Pool::new(
        factory.clone(),
        PoolConfig {
            max: 3,
            ..Default::default()
        },
    );

    let mut handles = Vec::new();
    for _ in 0..3 {
        handles.push(pool.acquire().await.unwrap());
    }
    for handle in handles {
        pool.release(handle).await.unwrap();
    }
    assert_eq!(pool.available(), 3);

    pool.clear().await;
    assert_eq!(pool.available(), 0);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn clear_replenishes_min_when_not_draining() {
    let factory = CountingFactory::new();
    let pool = Pool::new(
        factory.clone(),
        PoolConfig {
            max: 2,
            min: 1,
            ..Default::default()
        },
    );

    pool.ready().await;
    assert_eq!(pool.available(), 1);

    pool.clear().await;
    pool.ready().await;

    // The old resource was destroyed and a fresh one took its place.
    assert_eq!(pool.available(), 1);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn clear_while_draining_does_not_recreate() {
    let factory = CountingFactory::new();
    let pool = Pool::new(
        factory.clone(),
        PoolConfig {
            max: 4,
            min: 2,
            ..Default::default()
        },
    );

    pool.ready().await;
    pool.drain().await;
    pool.clear().await;

    assert_eq!(pool.size(), 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pool.size(), 0, "no replenishment while draining");
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn drain_then_clear_shuts_the_pool_down() {
    let factory = CountingFactory::new();
    let pool = Pool::new(factory.clone(), PoolConfig::default());

    let handle = pool.acquire().await.unwrap();
    pool.release(handle).await.unwrap();

    pool.drain().await;
    pool.clear().await;

    assert_eq!(pool.size(), 0);
    assert_eq!(pool.available(), 0);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 1);
}
