//! Idle-period gating for values that change on every keystroke.

use std::time::Duration;

use tokio::time::Instant;

/// Holds an applied value and the latest input that has not yet been idle long enough.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    applied: T,
    pending: Option<(T, Instant)>,
    idle: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, idle: Duration) -> Self {
        Self {
            applied: initial,
            pending: None,
            idle,
        }
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Record a new input. Every input restarts the idle window.
    pub fn input(&mut self, value: T) {
        self.input_at(value, Instant::now());
    }

    pub fn input_at(&mut self, value: T, at: Instant) {
        if self.pending.is_none() && value == self.applied {
            return;
        }
        self.pending = Some((value, at));
    }

    /// Latest input that is still waiting for the idle period to pass.
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.idle)
    }

    pub fn settle(&mut self) -> &T {
        self.settle_at(Instant::now())
    }

    /// Promote the pending input once `now` is past its deadline, then return the applied value.
    pub fn settle_at(&mut self, now: Instant) -> &T {
        if let Some(deadline) = self.deadline() {
            if now >= deadline {
                if let Some((value, _)) = self.pending.take() {
                    self.applied = value;
                }
            }
        }
        &self.applied
    }

    /// Wait until the latest input has been idle long enough and return it.
    pub async fn settled(&mut self) -> &T {
        if let Some(deadline) = self.deadline() {
            tokio::time::sleep_until(deadline).await;
        }
        self.settle()
    }

    /// Value currently in effect, without promoting anything.
    pub fn applied(&self) -> &T {
        &self.applied
    }
}
