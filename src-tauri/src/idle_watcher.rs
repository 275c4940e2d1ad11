use std::{
    sync::{Arc, Condvar, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::idle_timer::IdleTimerCore;

struct WatcherShared {
    state: Mutex<WatcherState>,
    wakeup: Condvar,
}

struct WatcherState {
    core: IdleTimerCore,
    shutdown: bool,
}

/// One worker thread parked on a condvar until the next countdown deadline,
/// woken early by activity events. Dropping the watcher joins the worker,
/// so no countdown survives it.
pub(crate) struct IdleWatcher {
    shared: Arc<WatcherShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl IdleWatcher {
    /// `on_idle` is invoked exactly once per idle transition, outside the
    /// internal lock.
    pub(crate) fn activate<F>(timeout: Duration, enabled: bool, on_idle: F) -> Result<Self, String>
    where
        F: Fn() + Send + 'static,
    {
        if timeout.is_zero() {
            return Err("Idle timeout must be positive.".to_string());
        }

        let shared = Arc::new(WatcherShared {
            state: Mutex::new(WatcherState {
                core: IdleTimerCore::new(timeout, enabled, Instant::now()),
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("idle-watcher".to_string())
            .spawn(move || run_worker(worker_shared, on_idle))
            .map_err(|error| format!("Failed to spawn idle watcher thread: {error}"))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub(crate) fn record_activity(&self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.core.record_activity(Instant::now());
        }
        self.shared.wakeup.notify_all();
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.core.set_enabled(enabled, Instant::now());
        }
        self.shared.wakeup.notify_all();
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.shared
            .state
            .lock()
            .map(|state| state.core.is_idle())
            .unwrap_or(false)
    }
}

impl Drop for IdleWatcher {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.shutdown = true;
        }
        self.shared.wakeup.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker<F>(shared: Arc<WatcherShared>, on_idle: F)
where
    F: Fn() + Send + 'static,
{
    let Ok(mut state) = shared.state.lock() else {
        return;
    };

    loop {
        if state.shutdown {
            return;
        }

        let now = Instant::now();
        if state.core.poll(now) {
            // The callback runs without the lock so it may query the timer.
            drop(state);
            on_idle();
            state = match shared.state.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            continue;
        }

        state = match state.core.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(now);
                match shared.wakeup.wait_timeout(state, wait) {
                    Ok((guard, _)) => guard,
                    Err(_) => return,
                }
            }
            // Disabled or already idle: nothing to count down, park until
            // an activity event, an enable toggle, or shutdown.
            None => match shared.wakeup.wait(state) {
                Ok(guard) => guard,
                Err(_) => return,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&count);
        (count, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn rejects_a_zero_timeout() {
        let (_, on_idle) = counter();
        assert!(IdleWatcher::activate(Duration::ZERO, true, on_idle).is_err());
    }

    #[test]
    fn fires_the_callback_exactly_once() {
        let (count, on_idle) = counter();
        let watcher = IdleWatcher::activate(Duration::from_millis(50), true, on_idle)
            .expect("watcher starts");

        thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(watcher.is_idle());
    }

    #[test]
    fn deactivation_before_expiry_prevents_the_callback() {
        let (count, on_idle) = counter();
        let watcher = IdleWatcher::activate(Duration::from_millis(200), true, on_idle)
            .expect("watcher starts");
        drop(watcher);

        thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn activity_postpones_the_idle_transition() {
        let (count, on_idle) = counter();
        let watcher = IdleWatcher::activate(Duration::from_millis(300), true, on_idle)
            .expect("watcher starts");

        thread::sleep(Duration::from_millis(150));
        watcher.record_activity();
        thread::sleep(Duration::from_millis(100));

        // 250ms after activation, but only 100ms after the reset.
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!watcher.is_idle());

        thread::sleep(Duration::from_millis(500));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(watcher.is_idle());
    }

    #[test]
    fn disabled_watcher_stays_active_until_reenabled() {
        let (count, on_idle) = counter();
        let watcher = IdleWatcher::activate(Duration::from_millis(100), false, on_idle)
            .expect("watcher starts");

        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!watcher.is_idle());

        watcher.set_enabled(true);
        thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn activity_after_the_transition_rearms_the_countdown() {
        let (count, on_idle) = counter();
        let watcher = IdleWatcher::activate(Duration::from_millis(50), true, on_idle)
            .expect("watcher starts");

        thread::sleep(Duration::from_millis(250));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        watcher.record_activity();
        assert!(!watcher.is_idle());
        thread::sleep(Duration::from_millis(250));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
