use std::time::Duration;

use tauri::{AppHandle, Emitter, Manager};

use crate::{
    idle_watcher::IdleWatcher, logging::append_desktop_log, ActivityKind, ApiConfig,
    BackendBridgeState, BackendState, BackendStatus, IdleSessionState, MAIN_WINDOW_LABEL,
};

#[tauri::command]
pub(crate) fn desktop_bridge_is_desktop_runtime() -> bool {
    true
}

// Errors until the backend has reached Running.
#[tauri::command]
pub(crate) fn desktop_bridge_get_api_config(app_handle: AppHandle) -> Result<ApiConfig, String> {
    let state = app_handle.state::<BackendState>();
    state
        .api_config()
        .ok_or_else(|| "Backend endpoint is not available yet.".to_string())
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_backend_state(app_handle: AppHandle) -> BackendBridgeState {
    let state = app_handle.state::<BackendState>();
    let status = state.status();
    BackendBridgeState {
        running: status == BackendStatus::Running,
        status: status.label(),
        port: state.api_config().map(|config| config.port),
    }
}

// Replacing a running watcher joins its worker first, so re-activation
// never stacks timers.
#[tauri::command]
pub(crate) fn desktop_bridge_activate_idle_timer(
    app_handle: AppHandle,
    timeout_millis: u64,
    enabled: Option<bool>,
) -> Result<(), String> {
    if timeout_millis == 0 {
        return Err("Idle timeout must be positive.".to_string());
    }

    let on_idle_handle = app_handle.clone();
    let watcher = IdleWatcher::activate(
        Duration::from_millis(timeout_millis),
        enabled.unwrap_or(true),
        move || {
            append_desktop_log("idle timeout reached; notifying session");
            if let Some(window) = on_idle_handle.get_webview_window(MAIN_WINDOW_LABEL) {
                if let Err(error) = window.emit("session-idle", ()) {
                    append_desktop_log(&format!("failed to emit session-idle: {error}"));
                }
            }
        },
    )?;

    let idle_state = app_handle.state::<IdleSessionState>();
    let mut guard = idle_state
        .watcher
        .lock()
        .map_err(|_| "Idle timer lock poisoned.".to_string())?;
    *guard = Some(watcher);
    Ok(())
}

#[tauri::command]
pub(crate) fn desktop_bridge_deactivate_idle_timer(app_handle: AppHandle) -> Result<(), String> {
    let idle_state = app_handle.state::<IdleSessionState>();
    let mut guard = idle_state
        .watcher
        .lock()
        .map_err(|_| "Idle timer lock poisoned.".to_string())?;
    *guard = None;
    Ok(())
}

// Reporting without an active timer is a no-op.
#[tauri::command]
pub(crate) fn desktop_bridge_report_activity(
    app_handle: AppHandle,
    kind: String,
) -> Result<(), String> {
    kind.parse::<ActivityKind>()?;

    let idle_state = app_handle.state::<IdleSessionState>();
    let guard = idle_state
        .watcher
        .lock()
        .map_err(|_| "Idle timer lock poisoned.".to_string())?;
    if let Some(watcher) = guard.as_ref() {
        watcher.record_activity();
    }
    Ok(())
}

#[tauri::command]
pub(crate) fn desktop_bridge_set_idle_enabled(
    app_handle: AppHandle,
    enabled: bool,
) -> Result<(), String> {
    let idle_state = app_handle.state::<IdleSessionState>();
    let guard = idle_state
        .watcher
        .lock()
        .map_err(|_| "Idle timer lock poisoned.".to_string())?;
    match guard.as_ref() {
        Some(watcher) => {
            watcher.set_enabled(enabled);
            Ok(())
        }
        None => Err("Idle timer is not active.".to_string()),
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_is_session_idle(app_handle: AppHandle) -> bool {
    app_handle
        .state::<IdleSessionState>()
        .watcher
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(IdleWatcher::is_idle))
        .unwrap_or(false)
}
