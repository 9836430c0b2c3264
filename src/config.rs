//! Pool configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a resource pool.
///
/// All fields have sensible defaults; construct with struct-update syntax:
///
/// ```
/// use tidepool::PoolConfig;
///
/// let config = PoolConfig {
///     max: 8,
///     min: 2,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfig {
    /// Absolute ceiling on live resources plus in-flight creations
    pub max: usize,
    /// Floor the pool replenishes to while started and not draining
    pub min: usize,
    /// Dispense order for the idle cache: `true` = oldest idle first,
    /// `false` = most recently returned first
    pub fifo: bool,
    /// Number of priority slots for waiters; priorities outside
    /// `[0, priority_range)` are clamped to the lowest priority
    pub priority_range: usize,
    /// Cap on queued waiters; `None` means unbounded
    pub max_waiting_clients: Option<usize>,
    /// Per-request acquire timeout; `None` waits forever
    pub acquire_timeout: Option<Duration>,
    /// Per-resource destroy timeout; `None` waits forever
    pub destroy_timeout: Option<Duration>,
    /// Validate resources before dispatching them to a waiter
    pub test_on_borrow: bool,
    /// Validate resources on release before re-idling them
    pub test_on_return: bool,
    /// Interval between background eviction runs; zero disables the evictor
    pub eviction_run_interval: Duration,
    /// How many idle cache entries each eviction run inspects
    pub num_tests_per_eviction_run: usize,
    /// Soft idle threshold: evict only while more than `min` resources
    /// remain idle; `None` disables
    pub soft_idle_timeout: Option<Duration>,
    /// Hard idle threshold: evict regardless of `min`; `None` disables
    pub idle_timeout: Option<Duration>,
    /// Start the pool (evictor scheduling, minimum replenishment) at
    /// construction instead of waiting for an explicit `start()`
    pub autostart: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max: 1,
            min: 0,
            fifo: true,
            priority_range: 1,
            max_waiting_clients: None,
            acquire_timeout: None,
            destroy_timeout: None,
            test_on_borrow: false,
            test_on_return: false,
            eviction_run_interval: Duration::ZERO,
            num_tests_per_eviction_run: 3,
            soft_idle_timeout: None,
            idle_timeout: Some(Duration::from_secs(30)),
            autostart: true,
        }
    }
}

impl PoolConfig {
    /// Clamp fields into their valid ranges.
    ///
    /// `max` is raised to at least 1, `min` is lowered to at most `max`,
    /// and `priority_range` is raised to at least 1. Out-of-range values
    /// are corrected rather than rejected.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max = self.max.max(1);
        self.min = self.min.min(self.max);
        self.priority_range = self.priority_range.max(1);
        self
    }
}
