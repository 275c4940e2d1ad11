use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::{error::StartupError, READY_POLL_INTERVAL_MS, READY_SENTINEL};

/// Bounded by `timeout`; aborted early when the exit probe reports the
/// child is gone.
pub(crate) fn wait_for_ready<F>(
    lines: &Receiver<String>,
    timeout: Duration,
    mut poll_exit: F,
) -> Result<(), StartupError>
where
    F: FnMut() -> Result<Option<String>, String>,
{
    let started = Instant::now();
    loop {
        match lines.recv_timeout(Duration::from_millis(READY_POLL_INTERVAL_MS)) {
            Ok(line) if is_ready_sentinel(&line) => return Ok(()),
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdout closed; the exit probe below reports what happened.
                thread::sleep(Duration::from_millis(50));
            }
        }

        if let Some(status) = poll_exit().map_err(StartupError::Process)? {
            return Err(StartupError::ExitedBeforeReady { status });
        }
        if started.elapsed() >= timeout {
            return Err(StartupError::ReadinessTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    }
}

// The sentinel may carry trailing details but must stand alone as the
// first word of the line.
pub(crate) fn is_ready_sentinel(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed == READY_SENTINEL
        || trimmed
            .strip_prefix(READY_SENTINEL)
            .is_some_and(|rest| rest.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn sentinel_line_resolves_readiness() {
        let (sender, receiver) = mpsc::channel();
        sender.send("booting portfolio engine".to_string()).unwrap();
        sender.send(format!("{READY_SENTINEL} port=4242")).unwrap();

        let result = wait_for_ready(&receiver, Duration::from_secs(2), || Ok(None));
        assert!(result.is_ok());
    }

    #[test]
    fn recognizes_the_bare_sentinel_only_as_a_full_word() {
        assert!(is_ready_sentinel(READY_SENTINEL));
        assert!(is_ready_sentinel(&format!("  {READY_SENTINEL} port=1\n")));
        assert!(!is_ready_sentinel(&format!("{READY_SENTINEL}X")));
        assert!(!is_ready_sentinel("starting up"));
    }

    #[test]
    fn child_exit_is_reported_as_exited_before_ready() {
        // Dropped sender models the child's stdout closing on exit.
        let (_, receiver) = mpsc::channel::<String>();

        let result = wait_for_ready(&receiver, Duration::from_secs(2), || {
            Ok(Some("exit status: 3".to_string()))
        });
        assert!(matches!(
            result,
            Err(StartupError::ExitedBeforeReady { status }) if status == "exit status: 3"
        ));
    }

    #[test]
    fn silence_past_the_budget_is_a_readiness_timeout() {
        let (sender, receiver) = mpsc::channel::<String>();

        let result = wait_for_ready(&receiver, Duration::from_millis(250), || Ok(None));
        assert!(matches!(
            result,
            Err(StartupError::ReadinessTimeout { timeout_ms: 250 })
        ));
        drop(sender);
    }

    #[test]
    fn probe_failures_propagate() {
        let (_sender, receiver) = mpsc::channel::<String>();

        let result = wait_for_ready(&receiver, Duration::from_secs(1), || {
            Err("lock poisoned".to_string())
        });
        assert!(matches!(result, Err(StartupError::Process(_))));
    }
}
