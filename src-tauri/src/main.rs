#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod backend_launch;
mod backend_process;
mod backend_readiness;
mod desktop_bridge_commands;
mod error;
mod idle_timer;
mod idle_watcher;
mod logging;
mod main_window;
mod port_allocator;
mod runtime_paths;
mod startup_mode;
mod startup_task;

pub(crate) use app_constants::*;
pub(crate) use app_types::{
    ActivityKind, ApiConfig, BackendBridgeState, BackendState, BackendStatus, IdleSessionState,
    LaunchPlan, RuntimeManifest,
};

fn main() {
    app_runtime::run();
}
