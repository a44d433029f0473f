use super::controller::PollOutcome;
use std::time::{Duration, Instant};

/// One-shot refresh timer for the polling loop.
///
/// After each drain the controller says whether it wants another pass; the
/// schedule remembers when that pass is due.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollSchedule {
    next: Option<Instant>,
}

impl PollSchedule {
    pub fn schedule(&mut self, now: Instant, after: Duration) {
        self.next = Some(now + after);
    }

    pub fn clear(&mut self) {
        self.next = None;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_some_and(|at| now >= at)
    }

    pub fn apply(&mut self, outcome: PollOutcome, now: Instant) {
        match outcome {
            PollOutcome::Reschedule(after) => self.schedule(now, after),
            PollOutcome::Settled => self.clear(),
        }
    }
}
