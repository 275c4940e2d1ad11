use std::thread;

use tauri::AppHandle;

use crate::{backend_process, logging::append_startup_log, main_window, startup_mode::StartupMode};

/// Runs the backend bootstrap off the main thread so the event loop stays
/// responsive during the readiness wait. Window creation goes through the
/// handle, which dispatches back to the main thread.
pub(crate) fn spawn_startup_task(app_handle: AppHandle, mode: StartupMode) {
    let task_handle = app_handle.clone();
    if let Err(error) = spawn_startup_thread(move || run_startup(&task_handle, mode)) {
        show_startup_error(&app_handle, &format!("Failed to spawn startup task: {error}"));
    }
}

fn run_startup(app_handle: &AppHandle, mode: StartupMode) {
    let port = match backend_process::start_backend(app_handle, mode) {
        Ok(port) => port,
        Err(error) => {
            show_startup_error(app_handle, &error.to_string());
            return;
        }
    };

    // Window creation is sequenced after `Running`, so the page can fetch
    // its endpoint the moment it loads.
    if let Err(error) = main_window::create_main_window(app_handle, mode) {
        show_startup_error(app_handle, &error);
        return;
    }
    append_startup_log(&format!("main window created; api port {port}"));
}

fn spawn_startup_thread<F>(task: F) -> std::io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name("startup".to_string()).spawn(task)
}

fn show_startup_error(app_handle: &AppHandle, message: &str) {
    append_startup_log(&format!("startup failed: {message}"));
    eprintln!("Folio startup failed: {message}");
    app_handle.exit(1);
}
