//! Cancel-and-reschedule timer.
//!
//! Only the most recent request inside the settle window counts: every
//! [`Debouncer::schedule`] replaces the pending deadline instead of queueing
//! another one. The debouncer owns no timer of its own; the caller polls it
//! with the current instant or sleeps until [`Debouncer::deadline`].

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    settle: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            deadline: None,
        }
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// (Re)arm the timer a full settle period after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.schedule_in(now, self.settle);
    }

    /// (Re)arm the timer `delay` after `now`.
    pub fn schedule_in(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and return `true` if the deadline has been reached.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
