//! Priority waiter queue
//!
//! A fixed-width array of FIFO slots indexed by priority. Dequeue walks from
//! slot 0 (highest priority) upward and takes the head of the first non-empty
//! slot. Waiters whose issuer went away are purged lazily; waiters that time
//! out remove themselves by id.

use std::collections::VecDeque;

use crate::request::Request;

pub(crate) struct PriorityQueue<V> {
    slots: Vec<VecDeque<Request<V>>>,
}

impl<V> PriorityQueue<V> {
    /// `priority_range` is assumed normalized to at least 1.
    pub(crate) fn new(priority_range: usize) -> Self {
        debug_assert!(priority_range >= 1);
        Self {
            slots: (0..priority_range).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Append a request to the FIFO slot for `priority`. Priorities outside
    /// `[0, priority_range)` are clamped to the lowest priority slot.
    pub(crate) fn enqueue(&mut self, request: Request<V>, priority: usize) {
        let slot = priority.min(self.slots.len() - 1);
        self.slots[slot].push_back(request);
    }

    /// Take the head of the first non-empty slot, highest priority first.
    pub(crate) fn dequeue(&mut self) -> Option<Request<V>> {
        self.slots.iter_mut().find_map(VecDeque::pop_front)
    }

    /// Remove a queued request by id. O(n) over its slot; slots are short.
    pub(crate) fn remove(&mut self, id: u64) -> Option<Request<V>> {
        for slot in &mut self.slots {
            if let Some(pos) = slot.iter().position(|r| r.id() == id) {
                return slot.remove(pos);
            }
        }
        None
    }

    /// Drop requests whose issuer stopped waiting.
    pub(crate) fn purge_canceled(&mut self) {
        for slot in &mut self.slots {
            slot.retain(|r| !r.is_canceled());
        }
    }

    /// Total queued requests across all slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().map(VecDeque::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64) -> (Request<u32>, crate::deferred::DeferredFuture<u32>) {
        Request::new(id)
    }

    #[test]
    fn dequeue_walks_priorities_in_order() {
        let mut queue = PriorityQueue::new(3);
        let (low, _f1) = request(1);
        let (high, _f2) = request(2);
        let (mid, _f3) = request(3);
        queue.enqueue(low, 2);
        queue.enqueue(high, 0);
        queue.enqueue(mid, 1);

        assert_eq!(queue.dequeue().unwrap().id(), 2);
        assert_eq!(queue.dequeue().unwrap().id(), 3);
        assert_eq!(queue.dequeue().unwrap().id(), 1);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn fifo_within_a_slot() {
        let mut queue = PriorityQueue::new(1);
        let (first, _f1) = request(1);
        let (second, _f2) = request(2);
        queue.enqueue(first, 0);
        queue.enqueue(second, 0);

        assert_eq!(queue.dequeue().unwrap().id(), 1);
        assert_eq!(queue.dequeue().unwrap().id(), 2);
    }

    #[test]
    fn out_of_range_priority_clamps_to_lowest() {
        let mut queue = PriorityQueue::new(2);
        let (clamped, _f1) = request(1);
        let (normal, _f2) = request(2);
        queue.enqueue(clamped, 99);
        queue.enqueue(normal, 0);

        // Priority 99 landed in the lowest slot (index 1).
        assert_eq!(queue.dequeue().unwrap().id(), 2);
        assert_eq!(queue.dequeue().unwrap().id(), 1);
    }

    #[test]
    fn remove_by_id() {
        let mut queue = PriorityQueue::new(2);
        let (a, _f1) = request(1);
        let (b, _f2) = request(2);
        queue.enqueue(a, 0);
        queue.enqueue(b, 1);

        assert_eq!(queue.len(), 2);
        assert!(queue.remove(2).is_some());
        assert!(queue.remove(2).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue().unwrap().id(), 1);
    }

    #[test]
    fn purge_drops_canceled_waiters() {
        let mut queue = PriorityQueue::new(1);
        let (kept, _kept_future) = request(1);
        let (canceled, canceled_future) = request(2);
        queue.enqueue(kept, 0);
        queue.enqueue(canceled, 0);
        drop(canceled_future);

        queue.purge_canceled();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue().unwrap().id(), 1);
    }
}
