use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};
use url::Url;

use crate::{
    startup_mode::StartupMode, APP_NAME, DEFAULT_DEV_SERVER_URL, DEV_SERVER_URL_ENV,
    MAIN_WINDOW_LABEL,
};

/// Only called once the backend has reached `Running`, so the endpoint
/// handshake is answerable as soon as the page can invoke it.
pub(crate) fn create_main_window(app_handle: &AppHandle, mode: StartupMode) -> Result<(), String> {
    let url = content_url(mode)?;
    WebviewWindowBuilder::new(app_handle, MAIN_WINDOW_LABEL, url)
        .title(APP_NAME)
        .inner_size(1280.0, 800.0)
        .min_inner_size(960.0, 600.0)
        .build()
        .map(|_| ())
        .map_err(|error| format!("Failed to create main window: {error}"))
}

fn content_url(mode: StartupMode) -> Result<WebviewUrl, String> {
    match mode {
        StartupMode::Development => {
            let raw = std::env::var(DEV_SERVER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_DEV_SERVER_URL.to_string());
            let parsed = Url::parse(raw.trim())
                .map_err(|error| format!("Invalid dev server URL '{raw}': {error}"))?;
            Ok(WebviewUrl::External(parsed))
        }
        StartupMode::Production => Ok(WebviewUrl::App("index.html".into())),
    }
}

/// Second-launch handler for the single-instance plugin.
pub(crate) fn focus_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        log("focus_main_window skipped: main window not found");
        return;
    };
    if let Err(error) = window.unminimize() {
        log(&format!("failed to unminimize main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        log(&format!("failed to focus main window: {error}"));
    }
}
