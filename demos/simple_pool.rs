//! Simple pooling example
//!
//! Pools fake connections, exercises acquire/release and the waiter queue,
//! then shuts the pool down cleanly.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tidepool::{Error, Factory, Pool, PoolConfig, Result};

struct Connection {
    id: u32,
    queries: u32,
}

#[derive(Default)]
struct ConnectionFactory {
    next_id: AtomicU32,
}

impl Factory for ConnectionFactory {
    type Resource = Connection;

    async fn create(&self) -> Result<Connection> {
        // Simulate connection setup latency.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if id == u32::MAX {
            return Err(Error::factory("connection ids exhausted"));
        }
        Ok(Connection { id, queries: 0 })
    }

    async fn destroy(&self, conn: Connection) -> Result<()> {
        println!("closing connection {} after {} queries", conn.id, conn.queries);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let pool = Pool::new(
        ConnectionFactory::default(),
        PoolConfig {
            max: 4,
            min: 2,
            acquire_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        },
    );

    println!("waiting for the pool to warm up to min...");
    pool.ready().await;
    println!("ready: {} connections idle", pool.available());

    // Borrow, use, return.
    let mut conn = pool.acquire().await?;
    conn.queries += 1;
    println!("ran a query on connection {}", conn.id);
    pool.release(conn).await?;

    // A burst of concurrent borrowers, bounded by `max`.
    let mut tasks = Vec::new();
    for worker in 0..8 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await?;
            conn.queries += 1;
            println!("worker {worker} used connection {}", conn.id);
            pool.release(conn).await
        }));
    }
    for task in tasks {
        task.await.expect("worker panicked")?;
    }

    let stats = pool.stats();
    println!(
        "served {} acquisitions over {} connections",
        stats.total_acquisitions, stats.created
    );

    println!("draining...");
    pool.drain().await;
    pool.clear().await;
    println!("done: pool size is {}", pool.size());

    Ok(())
}
