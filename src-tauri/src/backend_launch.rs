use std::{
    env, fs,
    path::{Path, PathBuf},
};

use tauri::{path::BaseDirectory, AppHandle, Manager};

use crate::{
    error::StartupError, startup_mode::StartupMode, LaunchPlan, RuntimeManifest, BACKEND_CMD_ENV,
    BACKEND_CWD_ENV, SOURCE_DIR_ENV,
};

/// Picks the backend command line for `mode`. A custom command from the
/// environment wins over both built-in plans.
pub(crate) fn resolve_launch_plan(
    app: &AppHandle,
    mode: StartupMode,
    port: u16,
) -> Result<LaunchPlan, StartupError> {
    if let Some(custom_cmd) = env::var(BACKEND_CMD_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return resolve_custom_launch(&custom_cmd, port);
    }

    match mode {
        StartupMode::Production => resolve_packaged_launch(app, port),
        StartupMode::Development => resolve_dev_launch(port),
    }
}

pub(crate) fn resolve_custom_launch(
    custom_cmd: &str,
    port: u16,
) -> Result<LaunchPlan, StartupError> {
    let mut pieces = shlex::split(custom_cmd)
        .ok_or_else(|| StartupError::Launch(format!("Invalid {BACKEND_CMD_ENV}: {custom_cmd}")))?;
    if pieces.is_empty() {
        return Err(StartupError::Launch(format!("{BACKEND_CMD_ENV} is empty.")));
    }

    let cmd = pieces.remove(0);
    let mut args = pieces;
    args.push("--port".to_string());
    args.push(port.to_string());

    let cwd = env::var(BACKEND_CWD_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    Ok(LaunchPlan {
        cmd,
        args,
        cwd,
        packaged_mode: false,
    })
}

fn resolve_packaged_launch(app: &AppHandle, port: u16) -> Result<LaunchPlan, StartupError> {
    let manifest_path = resolve_resource_path(app, "backend/runtime-manifest.json")
        .filter(|path| path.is_file())
        .ok_or_else(|| StartupError::Launch("Packaged backend manifest is missing.".to_string()))?;
    let backend_dir = manifest_path
        .parent()
        .ok_or_else(|| {
            StartupError::Launch(format!(
                "Invalid backend manifest path: {}",
                manifest_path.display()
            ))
        })?
        .to_path_buf();

    let manifest = read_runtime_manifest(&manifest_path)?;
    packaged_plan_from_manifest(&manifest, &backend_dir, port)
}

pub(crate) fn read_runtime_manifest(path: &Path) -> Result<RuntimeManifest, StartupError> {
    let text = fs::read_to_string(path).map_err(|error| {
        StartupError::Launch(format!(
            "Failed to read packaged backend manifest {}: {}",
            path.display(),
            error
        ))
    })?;
    serde_json::from_str(&text).map_err(|error| {
        StartupError::Launch(format!(
            "Failed to parse packaged backend manifest {}: {}",
            path.display(),
            error
        ))
    })
}

pub(crate) fn packaged_plan_from_manifest(
    manifest: &RuntimeManifest,
    backend_dir: &Path,
    port: u16,
) -> Result<LaunchPlan, StartupError> {
    let default_command_relative = if cfg!(target_os = "windows") {
        PathBuf::from("node").join("node.exe")
    } else {
        PathBuf::from("node").join("bin").join("node")
    };
    let command_path = backend_dir.join(
        manifest
            .command
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or(default_command_relative),
    );
    if !command_path.is_file() {
        return Err(StartupError::Launch(format!(
            "Packaged backend runtime is missing: {}",
            command_path.display()
        )));
    }

    let entrypoint_path =
        backend_dir.join(manifest.entrypoint.as_deref().unwrap_or("server/main.js"));
    if !entrypoint_path.is_file() {
        return Err(StartupError::Launch(format!(
            "Packaged backend entrypoint is missing: {}",
            entrypoint_path.display()
        )));
    }

    Ok(LaunchPlan {
        cmd: command_path.to_string_lossy().to_string(),
        args: vec![
            entrypoint_path.to_string_lossy().to_string(),
            "--port".to_string(),
            port.to_string(),
        ],
        cwd: backend_dir.to_path_buf(),
        packaged_mode: true,
    })
}

fn resolve_dev_launch(port: u16) -> Result<LaunchPlan, StartupError> {
    let source_root = detect_backend_source_root().ok_or_else(|| {
        StartupError::Launch(format!(
            "Cannot locate backend source directory. Set {SOURCE_DIR_ENV} to the repository checkout."
        ))
    })?;

    Ok(LaunchPlan {
        cmd: "npm".to_string(),
        args: vec![
            "run".to_string(),
            "serve:backend".to_string(),
            "--".to_string(),
            "--port".to_string(),
            port.to_string(),
        ],
        cwd: source_root,
        packaged_mode: false,
    })
}

fn detect_backend_source_root() -> Option<PathBuf> {
    if let Ok(source_dir) = env::var(SOURCE_DIR_ENV) {
        let candidate = PathBuf::from(source_dir.trim());
        if is_backend_source_root(&candidate) {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    let workspace_root = workspace_root_dir();
    let candidates = [workspace_root.join("server"), workspace_root];
    for candidate in candidates {
        if is_backend_source_root(&candidate) {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }
    None
}

pub(crate) fn is_backend_source_root(candidate: &Path) -> bool {
    candidate.join("package.json").is_file()
}

fn workspace_root_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    candidate.canonicalize().unwrap_or(candidate)
}

fn resolve_resource_path(app: &AppHandle, relative_path: &str) -> Option<PathBuf> {
    app.path()
        .resolve(relative_path, BaseDirectory::Resource)
        .ok()
}
