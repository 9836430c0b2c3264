//! Eviction policy
//!
//! A pure decision: given the thresholds and an idle resource's timing,
//! should it be destroyed? The soft threshold only fires while the idle
//! cache holds more than `min` entries; the hard threshold always fires.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct EvictionPolicy {
    pub(crate) soft_idle_timeout: Option<Duration>,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) min: usize,
}

pub(crate) fn should_evict(
    policy: &EvictionPolicy,
    idle_since: Instant,
    available_count: usize,
    now: Instant,
) -> bool {
    let idle_for = now.saturating_duration_since(idle_since);

    if let Some(soft) = policy.soft_idle_timeout
        && !soft.is_zero()
        && idle_for > soft
        && available_count > policy.min
    {
        return true;
    }

    if let Some(hard) = policy.idle_timeout
        && !hard.is_zero()
        && idle_for > hard
    {
        return true;
    }

    false
}
