use std::collections::VecDeque;

use crate::ice::CandidateRecord;

/// Ordered buffer for one direction of candidates (local-pending-send or
/// remote-pending-apply).
///
/// The queue also tracks whether its direction is *ready* (the matching
/// description is set). Before that, [`offer`](Self::offer) buffers; after
/// it, candidates pass straight through. [`mark_ready`](Self::mark_ready)
/// hands back the backlog exactly once per readiness transition.
#[derive(Debug, Default)]
pub struct IceCandidateQueue {
    pending: VecDeque<CandidateRecord>,
    ready: bool,
}

impl IceCandidateQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the backlog regardless of readiness.
    pub fn enqueue(&mut self, candidate: CandidateRecord) {
        self.pending.push_back(candidate);
    }

    /// Returns and clears the backlog in arrival order.
    pub fn flush(&mut self) -> Vec<CandidateRecord> {
        self.pending.drain(..).collect()
    }

    /// Passes `candidate` through when ready, otherwise buffers it.
    #[must_use]
    pub fn offer(&mut self, candidate: CandidateRecord) -> Option<CandidateRecord> {
        if self.ready {
            Some(candidate)
        } else {
            self.enqueue(candidate);
            None
        }
    }

    /// Marks the direction ready and returns the backlog. Only the first call
    /// after construction or [`clear`](Self::clear) returns anything.
    pub fn mark_ready(&mut self) -> Vec<CandidateRecord> {
        if self.ready {
            return Vec::new();
        }
        self.ready = true;
        self.flush()
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops the backlog and forgets readiness.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.ready = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> CandidateRecord {
        CandidateRecord::new(s)
    }

    #[test]
    fn flush_preserves_arrival_order_and_empties() {
        let mut q = IceCandidateQueue::new();
        q.enqueue(c("a"));
        q.enqueue(c("b"));
        q.enqueue(c("c"));

        assert_eq!(q.flush(), vec![c("a"), c("b"), c("c")]);
        assert!(q.is_empty());
        assert!(q.flush().is_empty());
    }

    #[test]
    fn offer_buffers_until_ready_then_passes_through() {
        let mut q = IceCandidateQueue::new();
        assert_eq!(q.offer(c("early-1")), None);
        assert_eq!(q.offer(c("early-2")), None);
        assert_eq!(q.len(), 2);

        assert_eq!(q.mark_ready(), vec![c("early-1"), c("early-2")]);
        assert_eq!(q.offer(c("late")), Some(c("late")));
        assert!(q.is_empty());
    }

    #[test]
    fn mark_ready_flushes_only_once() {
        let mut q = IceCandidateQueue::new();
        let _ = q.offer(c("x"));
        assert_eq!(q.mark_ready().len(), 1);
        assert!(q.mark_ready().is_empty());
        assert!(q.is_ready());
    }

    #[test]
    fn clear_resets_readiness() {
        let mut q = IceCandidateQueue::new();
        let _ = q.mark_ready();
        q.enqueue(c("stale"));
        q.clear();

        assert!(!q.is_ready());
        assert!(q.is_empty());
        assert_eq!(q.offer(c("fresh")), None);
    }
}
