//! # tidepool
//!
//! A generic async resource pool. Amortizes the cost of expensive resources
//! (database connections, sockets, parsers, file handles) by holding a
//! bounded set of them, lending them to callers on demand, and reclaiming
//! them on release.
//!
//! - bounded by `max`, replenished to `min`
//! - priority-ordered waiter queue with per-request timeouts
//! - FIFO or LIFO dispensing of idle resources
//! - optional validation on borrow and on return
//! - background eviction of resources idle past a threshold
//! - graceful shutdown: `drain` waits for waiters and loans, `clear`
//!   destroys the idle cache
//!
//! ```no_run
//! use tidepool::{Error, Factory, Pool, PoolConfig, Result};
//!
//! struct TcpFactory;
//!
//! impl Factory for TcpFactory {
//!     type Resource = tokio::net::TcpStream;
//!
//!     async fn create(&self) -> Result<Self::Resource> {
//!         tokio::net::TcpStream::connect("127.0.0.1:5432")
//!             .await
//!             .map_err(|e| Error::factory_with_source("connect failed", e))
//!     }
//!
//!     async fn destroy(&self, _stream: Self::Resource) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<()> {
//! let pool = Pool::new(TcpFactory, PoolConfig { max: 8, ..Default::default() });
//! let conn = pool.acquire().await?;
//! // use *conn ...
//! pool.release(conn).await?;
//! pool.drain().await;
//! pool.clear().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod deferred;
mod error;
mod events;
mod evictor;
mod factory;
mod idle;
mod loan;
mod pool;
mod pooled;
mod queue;
mod request;

pub use config::PoolConfig;
pub use error::{Error, Result};
pub use events::PoolEvent;
pub use factory::Factory;
pub use pool::{Pool, PoolStats};
pub use pooled::Pooled;
