use std::{
    env,
    io::{BufRead, BufReader},
    process::{Child, Command, Stdio},
    sync::mpsc,
    thread,
    time::Duration,
};

use tauri::{AppHandle, Manager};

use crate::{
    backend_launch, backend_readiness,
    error::StartupError,
    logging::{append_backend_log, append_desktop_log, append_shutdown_log},
    port_allocator,
    startup_mode::StartupMode,
    ApiConfig, BackendState, BackendStatus, LaunchPlan, API_HOST, API_PORT_ENV,
    BACKEND_TIMEOUT_ENV, DESKTOP_CLIENT_ENV, DEV_BACKEND_TIMEOUT_MS, EXIT_POLL_INTERVAL_MS,
    PACKAGED_BACKEND_TIMEOUT_MS,
};

/// Allocates a port, spawns the backend for `mode`, and waits for the
/// readiness handshake. Every failure is fatal to startup; nothing is
/// retried.
pub(crate) fn start_backend(app: &AppHandle, mode: StartupMode) -> Result<u16, StartupError> {
    let state = app.state::<BackendState>();
    let port = begin_startup(&state, port_allocator::allocate_port)?;
    let plan = backend_launch::resolve_launch_plan(app, mode, port)?;
    append_desktop_log(&format!(
        "launching backend on port {port}: {} {}",
        plan.cmd,
        plan.args.join(" ")
    ));

    let lines = spawn_backend(&state, &plan, port)?;

    let timeout = readiness_timeout(plan.packaged_mode);
    if let Err(error) = backend_readiness::wait_for_ready(&lines, timeout, || {
        poll_backend_exit(&state)
    }) {
        // A child that timed out is still running; do not leak it.
        state.stop_backend();
        state.set_status(BackendStatus::Exited(None));
        return Err(error);
    }

    state.set_status(BackendStatus::Running);
    state.set_api_config(ApiConfig {
        host: API_HOST.to_string(),
        port,
    });
    spawn_exit_monitor(app.clone());
    append_desktop_log(&format!("backend ready on port {port}"));
    Ok(port)
}

/// Port allocation comes first: if it fails, no child is ever spawned.
fn begin_startup<F>(state: &BackendState, allocate: F) -> Result<u16, StartupError>
where
    F: FnOnce() -> Result<u16, StartupError>,
{
    state.set_status(BackendStatus::Starting);
    allocate()
}

/// Stdout feeds the readiness handshake and the backend log; stderr is
/// logged, never fatal.
pub(crate) fn spawn_backend(
    state: &BackendState,
    plan: &LaunchPlan,
    port: u16,
) -> Result<mpsc::Receiver<String>, StartupError> {
    let mut command = Command::new(&plan.cmd);
    command
        .args(&plan.args)
        .current_dir(&plan.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env(DESKTOP_CLIENT_ENV, "1")
        .env(API_PORT_ENV, port.to_string());

    let mut child = command.spawn().map_err(|source| StartupError::Spawn {
        command: plan.cmd.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    *state
        .child
        .lock()
        .map_err(|_| StartupError::Process("Backend process lock poisoned.".to_string()))? =
        Some(child);

    let (line_sender, line_receiver) = mpsc::channel();
    if let Some(stdout) = stdout {
        let reader = thread::Builder::new()
            .name("backend-stdout".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                    append_backend_log(&line);
                    // After readiness the receiver is gone; keep logging.
                    let _ = line_sender.send(line);
                }
            });
        if let Err(error) = reader {
            state.stop_backend();
            return Err(StartupError::Process(format!(
                "Failed to spawn backend stdout reader: {error}"
            )));
        }
    }
    if let Some(stderr) = stderr {
        let reader = thread::Builder::new()
            .name("backend-stderr".to_string())
            .spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    append_backend_log(&format!("stderr: {line}"));
                }
            });
        if let Err(error) = reader {
            append_desktop_log(&format!("failed to spawn backend stderr reader: {error}"));
        }
    }

    Ok(line_receiver)
}

/// Exit probe for the readiness wait. Clears the handle once the child is
/// observed dead.
pub(crate) fn poll_backend_exit(state: &BackendState) -> Result<Option<String>, String> {
    let mut guard = state
        .child
        .lock()
        .map_err(|_| "Backend process lock poisoned.".to_string())?;
    let Some(child) = guard.as_mut() else {
        return Ok(Some("process handle missing".to_string()));
    };
    match child.try_wait() {
        Ok(Some(status)) => {
            *guard = None;
            Ok(Some(status.to_string()))
        }
        Ok(None) => Ok(None),
        Err(error) => Err(format!("Failed to poll backend process status: {error}")),
    }
}

// Fail-stop: a post-Running crash is recorded and logged, never restarted.
fn spawn_exit_monitor(app: AppHandle) {
    let monitor = thread::Builder::new()
        .name("backend-exit-monitor".to_string())
        .spawn(move || loop {
            thread::sleep(Duration::from_millis(EXIT_POLL_INTERVAL_MS));

            let state = app.state::<BackendState>();
            let mut guard = match state.child.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            // Handle already taken means an orderly shutdown.
            let Some(child) = guard.as_mut() else { return };

            match child.try_wait() {
                Ok(Some(status)) => {
                    *guard = None;
                    drop(guard);
                    state.set_status(BackendStatus::Exited(status.code()));
                    append_desktop_log(&format!("backend exited unexpectedly: {status}"));
                    return;
                }
                Ok(None) => {}
                Err(error) => {
                    drop(guard);
                    append_desktop_log(&format!(
                        "failed to poll backend process status: {error}"
                    ));
                    return;
                }
            }
        });
    if let Err(error) = monitor {
        append_desktop_log(&format!("failed to spawn backend exit monitor: {error}"));
    }
}

fn readiness_timeout(packaged_mode: bool) -> Duration {
    let default_ms = if packaged_mode {
        PACKAGED_BACKEND_TIMEOUT_MS
    } else {
        DEV_BACKEND_TIMEOUT_MS
    };
    let timeout_ms = env::var(BACKEND_TIMEOUT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default_ms);
    Duration::from_millis(timeout_ms)
}

impl BackendState {
    pub(crate) fn stop_backend(&self) {
        let mut child = match self.child.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(process) = child.as_mut() {
            append_shutdown_log("stopping backend process");
            stop_child_process(process);
            self.set_status(BackendStatus::Exited(None));
        }
    }
}

fn stop_child_process(child: &mut Child) {
    #[cfg(target_os = "windows")]
    {
        // Kill the whole tree; the backend forks workers on Windows.
        let _ = Command::new("taskkill")
            .args(["/pid", &child.id().to_string(), "/t", "/f"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status();
        let _ = child.wait();
        return;
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = child.kill();
        let _ = child.wait();
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    #[cfg(unix)]
    use std::path::PathBuf;

    use super::*;
    #[cfg(unix)]
    use crate::READY_SENTINEL;

    #[test]
    fn port_allocation_failure_aborts_before_any_spawn() {
        let state = BackendState::default();

        let result = begin_startup(&state, || {
            Err(StartupError::PortAllocation(io::Error::from(
                io::ErrorKind::AddrInUse,
            )))
        });

        assert!(matches!(result, Err(StartupError::PortAllocation(_))));
        assert!(state.child.lock().unwrap().is_none());
        assert_ne!(state.status(), BackendStatus::Running);
    }

    #[cfg(unix)]
    fn shell_plan(script: &str) -> LaunchPlan {
        LaunchPlan {
            cmd: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            packaged_mode: false,
        }
    }

    #[cfg(unix)]
    #[test]
    fn readiness_round_trip_with_a_real_child() {
        let state = BackendState::default();
        let plan = shell_plan(&format!("echo {READY_SENTINEL}; sleep 5"));

        let lines = spawn_backend(&state, &plan, 4242).expect("spawn succeeds");
        let ready = backend_readiness::wait_for_ready(&lines, Duration::from_secs(5), || {
            poll_backend_exit(&state)
        });
        assert!(ready.is_ok());

        state.stop_backend();
        assert_eq!(state.status(), BackendStatus::Exited(None));
        assert!(state.child.lock().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn child_that_dies_without_the_sentinel_reports_its_exit() {
        let state = BackendState::default();
        let plan = shell_plan("exit 3");

        let lines = spawn_backend(&state, &plan, 4242).expect("spawn succeeds");
        let ready = backend_readiness::wait_for_ready(&lines, Duration::from_secs(5), || {
            poll_backend_exit(&state)
        });
        assert!(matches!(
            ready,
            Err(StartupError::ExitedBeforeReady { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn spawn_failure_is_reported_without_storing_a_handle() {
        let state = BackendState::default();
        let plan = LaunchPlan {
            cmd: "/nonexistent/folio-backend".to_string(),
            args: vec![],
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            packaged_mode: false,
        };

        let result = spawn_backend(&state, &plan, 4242);
        assert!(matches!(result, Err(StartupError::Spawn { .. })));
        assert!(state.child.lock().unwrap().is_none());
    }

    #[test]
    fn stop_backend_without_a_child_is_a_no_op() {
        let state = BackendState::default();
        state.stop_backend();
        assert_eq!(state.status(), BackendStatus::NotStarted);
    }
}
