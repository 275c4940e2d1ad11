use std::time::{Duration, Instant};

/// Countdown behind the idle-session timeout. Pure deadline arithmetic:
/// the caller supplies every `Instant`, so tests drive a virtual clock.
#[derive(Debug)]
pub(crate) struct IdleTimerCore {
    timeout: Duration,
    enabled: bool,
    idle: bool,
    deadline: Option<Instant>,
}

impl IdleTimerCore {
    pub(crate) fn new(timeout: Duration, enabled: bool, now: Instant) -> Self {
        debug_assert!(timeout > Duration::ZERO);
        Self {
            timeout,
            enabled,
            idle: false,
            deadline: enabled.then(|| now + timeout),
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.idle
    }

    /// `None` while disabled and after the idle transition has fired.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        if self.idle {
            None
        } else {
            self.deadline
        }
    }

    /// Repeated calls coalesce into a deadline move; there is never more
    /// than one pending countdown.
    pub(crate) fn record_activity(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.idle = false;
        self.deadline = Some(now + self.timeout);
    }

    /// Re-enabling starts a fresh countdown from `now`; elapsed time does
    /// not carry over.
    pub(crate) fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.idle = false;
        self.deadline = enabled.then(|| now + self.timeout);
    }

    /// Returns `true` exactly once per idle transition. The countdown is
    /// not restarted after firing; the next activity event starts a new one.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        if !self.enabled || self.idle {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.idle = true;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
