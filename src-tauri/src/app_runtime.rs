use tauri::{AppHandle, Manager, RunEvent};

use crate::{
    logging::{append_desktop_log, append_startup_log},
    main_window,
    startup_mode::StartupMode,
    startup_task, BackendState, IdleSessionState,
};

pub(crate) fn run() {
    append_startup_log("desktop process starting");

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, _args, _cwd| {
            main_window::focus_main_window(app_handle, append_desktop_log);
        }))
        .manage(BackendState::default())
        .manage(IdleSessionState::default())
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::desktop_bridge_is_desktop_runtime,
            crate::desktop_bridge_commands::desktop_bridge_get_api_config,
            crate::desktop_bridge_commands::desktop_bridge_get_backend_state,
            crate::desktop_bridge_commands::desktop_bridge_activate_idle_timer,
            crate::desktop_bridge_commands::desktop_bridge_deactivate_idle_timer,
            crate::desktop_bridge_commands::desktop_bridge_report_activity,
            crate::desktop_bridge_commands::desktop_bridge_set_idle_enabled,
            crate::desktop_bridge_commands::desktop_bridge_is_session_idle,
        ])
        .setup(|app| {
            let app_handle = app.handle().clone();
            let mode = StartupMode::resolve();
            append_startup_log(&format!("startup mode: {}", mode.as_str()));

            // The readiness wait must not stall the event loop.
            startup_task::spawn_startup_task(app_handle, mode);
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { .. } | RunEvent::Exit => {
                shutdown(app_handle);
            }
            _ => {}
        });
}

fn shutdown(app_handle: &AppHandle) {
    // Joins the idle worker before the process goes away.
    if let Some(idle_state) = app_handle.try_state::<IdleSessionState>() {
        if let Ok(mut guard) = idle_state.watcher.lock() {
            *guard = None;
        }
    }

    let state = app_handle.state::<BackendState>();
    state.stop_backend();
}
