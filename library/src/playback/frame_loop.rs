use std::collections::BTreeSet;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FrameRequestId(pub u64);

/// Host hook for "call me on the next animation frame".
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Scheduler that only queues requests; the caller decides when frames run.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: BTreeSet<FrameRequestId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: FrameRequestId) -> bool {
        self.pending.contains(&id)
    }

    /// Hand out every queued request, as a host does when a frame fires.
    pub fn take_due(&mut self) -> Vec<FrameRequestId> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.pending.remove(&id);
    }
}

/// A recurring per-frame task with at most one outstanding request.
/// `stop` is idempotent.
#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameRequestId>,
}

impl FrameLoop {
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
        }
    }

    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel_frame(id);
        }
    }

    /// Claim a delivered frame. `false` for a request this loop no longer
    /// owns, which the caller must ignore.
    pub fn take(&mut self, id: FrameRequestId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_keeps_a_single_outstanding_request() {
        let mut scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(&mut scheduler);
        frame_loop.start(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 1);
        assert!(frame_loop.is_running());
    }

    #[test]
    fn stop_cancels_and_is_idempotent() {
        let mut scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(&mut scheduler);
        let id = frame_loop.pending.unwrap();
        assert!(scheduler.is_pending(id));

        frame_loop.stop(&mut scheduler);
        frame_loop.stop(&mut scheduler);
        assert!(!scheduler.is_pending(id));
        assert_eq!(scheduler.pending_count(), 0);
        assert!(!frame_loop.is_running());
    }

    #[test]
    fn stale_frames_are_rejected() {
        let mut scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::default();
        frame_loop.start(&mut scheduler);
        let due = scheduler.take_due();
        assert!(frame_loop.take(due[0]));
        assert!(!frame_loop.take(due[0]));
        assert!(!frame_loop.is_running());
    }
}
